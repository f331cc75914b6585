use clinic_token_core::RequestKind;
use clinic_token_tests::{RequestOptions, Response, TestCtxBuilder};
use eyre::Result;
use util::assert_rejected;

mod util;

const PHONE: &str = "9999999999";

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_tokens_are_consecutive() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    let first = ctx.api.book("A", PHONE, "2024-06-01").await??;
    assert!(first.success);
    assert_eq!(first.token, 1);
    assert_eq!(first.date.to_string(), "2024-06-01");
    assert_eq!(first.message, "Token booked successfully");

    let second = ctx.api.book("A", PHONE, "2024-06-01").await??;
    assert_eq!(second.token, 2, "The second token of a day must be 2.");

    assert_rejected(
        ctx.api.book("A", "123", "2024-06-01").await?,
        "Invalid phone number",
    );
    assert_eq!(
        ctx.service().availability(first.date).booked_count,
        2,
        "Rejected bookings must not count."
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_rejections() -> Result<()> {
    let ctx = TestCtxBuilder::new().at("2024-05-20 12:30:00")?.build().await?;

    assert_rejected(ctx.api.book("", PHONE, "2024-06-01").await?, "All fields are required");
    assert_rejected(ctx.api.book("A", "   ", "2024-06-01").await?, "All fields are required");
    assert_rejected(ctx.api.book("A", PHONE, "").await?, "All fields are required");
    assert_rejected(ctx.api.book("A", "12345abcde", "2024-06-01").await?, "Invalid phone number");
    assert_rejected(ctx.api.book("A", "99999999999", "2024-06-01").await?, "Invalid phone number");
    assert_rejected(ctx.api.book("A", PHONE, "01/06/2024").await?, "Invalid date");
    for padded in ["2024-06- 1", "2024- 6-01", "+2024-6-01"] {
        assert_rejected(ctx.api.book("A", PHONE, padded).await?, "Invalid date");
    }
    assert_rejected(ctx.api.book("A", PHONE, "2024-05-19").await?, "Cannot book past dates");
    assert!(ctx.service().bookings().is_empty());

    // today is still open before the session starts
    assert_eq!(ctx.api.book("A", PHONE, "2024-05-20").await??.token, 1);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_same_day_cutoff() -> Result<()> {
    let ctx = TestCtxBuilder::new().at("2024-05-20 16:59:59")?.build().await?;

    assert_eq!(ctx.api.book("A", PHONE, "2024-05-20").await??.token, 1);

    ctx.set_now("2024-05-20 17:00:00")?;
    assert_rejected(ctx.api.book("B", PHONE, "2024-05-20").await?, "Booking window closed");
    assert_eq!(ctx.api.book("B", PHONE, "2024-05-21").await??.token, 1);

    // at midnight the next day becomes today and the window reopens
    ctx.set_now("2024-05-21 00:00:00")?;
    assert_eq!(ctx.api.book("C", PHONE, "2024-05-21").await??.token, 2);
    assert_rejected(ctx.api.book("C", PHONE, "2024-05-20").await?, "Cannot book past dates");

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_capacity() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    for token in 1..=30 {
        let reply = ctx.api.book("A", PHONE, "2024-05-22").await??;
        assert_eq!(reply.token, token);
    }
    assert_rejected(ctx.api.book("A", PHONE, "2024-05-22").await?, "Tokens full");
    assert_eq!(ctx.api.book("A", PHONE, "2024-05-23").await??.token, 1);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_configured_capacity() -> Result<()> {
    let ctx = TestCtxBuilder::new().with_max_tokens(2).build().await?;

    ctx.api.book("A", PHONE, "2024-05-22").await??;
    ctx.api.book("B", PHONE, "2024-05-22").await??;
    assert_rejected(ctx.api.book("C", PHONE, "2024-05-22").await?, "Tokens full");

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_malformed_bodies() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    let options = RequestOptions::default();

    for body in ["", "not json", "[1, 2]", r#"{"name": "A", "phone": 9999999999, "date": "2024-06-01"}"#] {
        let response = ctx
            .api
            .make_request(RequestKind::Book, Some(body.into()), &options)
            .await?;
        assert_eq!(
            response,
            Response::Json {
                status: 400,
                body: r#"{"success":false,"message":"Invalid request body"}"#.into(),
            },
            "Malformed body {body:?} must be rejected."
        );
    }

    // absent keys count as empty fields
    let partial = serde_json::to_string(&serde_json::json!({ "name": "A" }))?;
    let response = ctx
        .api
        .make_request(RequestKind::Book, Some(partial), &options)
        .await?;
    assert!(matches!(
        response,
        Response::Json { status: 400, ref body } if body.contains("All fields are required")
    ));

    // unknown keys are ignored
    let form = serde_json::json!({
        "name": "A",
        "phone": PHONE,
        "date": "2024-06-01",
        "note": "first visit",
    });
    let response = ctx
        .api
        .make_request(RequestKind::Book, Some(form.to_string()), &options)
        .await?;
    assert!(matches!(response, Response::Json { status: 200, .. }));

    ctx.finish().await;
    Ok(())
}
