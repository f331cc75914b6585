//! Server implementation

#![warn(missing_docs)]

mod http;

use std::path::PathBuf;
use std::thread;

use clinic_token_core::{parse_time, Config, RequestHandler};
use eyre::{eyre, Result, WrapErr};
use tracing::{error, info};

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the token desk
    config: Config,

    /// Port for the HTTP server to listen on
    port: u16,
    /// Address for the HTTP server to listen on
    host: String,
    /// Number of threads answering HTTP requests
    worker_threads: u32,

    /// Print the hash of this password and exit
    hash_password: Option<String>,
}

impl Opts {
    fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse `args`, layering them over the configuration file (given by
    /// `-config`) and the `CLINIC_*` environment variables
    fn parse(args: impl Iterator<Item = String>) -> Result<Self> {
        let args: Vec<String> = args.collect();

        let mut config = match args.iter().position(|a| a == "-config") {
            Some(i) => {
                let path = args
                    .get(i + 1)
                    .map(PathBuf::from)
                    .ok_or_else(|| eyre!("-config takes a path"))?;
                Config::load(&path)?
            }
            None => Config::default(),
        };
        config.apply_env()?;

        let mut opts = Opts {
            port: 5000,
            host: String::from("127.0.0.1"),
            config,
            worker_threads: 4,
            hash_password: None,
        };

        let mut option: Option<String> = None;
        for arg in args {
            if let Some(opt) = option {
                match opt.as_str() {
                    "-config" => {}
                    "-port" => opts.port = arg.parse().wrap_err("-port takes a decimal u16")?,
                    "-host" => opts.host = arg,
                    "-worker-threads" => {
                        opts.worker_threads =
                            arg.parse().wrap_err("-worker-threads takes a decimal u32")?
                    }
                    "-max-tokens" => {
                        opts.config.max_tokens_per_day =
                            arg.parse().wrap_err("-max-tokens takes a decimal u32")?
                    }
                    "-session-start" => {
                        opts.config.session_start = parse_time("-session-start", &arg)?
                    }
                    "-admin-user" => opts.config.admin_username = arg,
                    "-hash-password" => opts.hash_password = Some(arg),
                    _ => return Err(eyre!("unknown option {opt}")),
                }
                option = None;
            } else {
                match arg.as_str() {
                    "-close-requires-admin" => opts.config.close_requires_admin = true,
                    "-keep-count-on-close" => opts.config.close_resets_count = false,
                    _ => option = Some(arg),
                }
            }
        }
        if let Some(opt) = option {
            return Err(eyre!("leftover option {opt}"));
        }
        if opts.worker_threads == 0 {
            return Err(eyre!("-worker-threads must be positive"));
        }

        Ok(opts)
    }
}

fn http_loop<H: RequestHandler>(server: &tiny_http::Server, handler: &H) {
    loop {
        match server.recv() {
            Ok(rq) => {
                if let Some(rq) = http::parse(rq) {
                    handler.handle(rq);
                }
            }
            Err(err) => error!("HTTP receive failed: {err}"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_token_server=info,clinic_token_desk=info".into()),
        )
        .init();

    let opts = Opts::from_args()?;

    if let Some(password) = &opts.hash_password {
        let hash = clinic_token_desk::hash_password(password)
            .map_err(|err| eyre!("could not hash password: {err}"))?;
        println!("{hash}");
        return Ok(());
    }

    let server = tiny_http::Server::http((opts.host.as_str(), opts.port))
        .map_err(|err| eyre!("could not listen on {}:{}: {err}", opts.host, opts.port))?;
    info!(
        host = %opts.host,
        port = opts.port,
        max_tokens_per_day = opts.config.max_tokens_per_day,
        session_start = %opts.config.session_start,
        "clinic token desk listening"
    );

    let desk = clinic_token_desk::launch(&opts.config);

    thread::scope(|s| -> Result<()> {
        for i in 0..opts.worker_threads {
            thread::Builder::new()
                .name(format!("worker_{i}"))
                .spawn_scoped(s, || http_loop(&server, &desk))?;
        }
        Ok(())
    })
}
