//! Container health check for `mcstatus`.
//!
//! With no argument it asks the local service on `$PORT` (default 8080) for
//! `/healthz`. A single argument overrides the URL. Exits non-zero unless the
//! service answers `ok` within two seconds.

use std::time::Duration;

const DEFAULT_PORT: &str = "8080";

fn target_url(arg: Option<String>, port: Option<String>) -> String {
    arg.unwrap_or_else(|| {
        let port = port.filter(|port| !port.is_empty());
        format!(
            "http://127.0.0.1:{}/healthz",
            port.as_deref().unwrap_or(DEFAULT_PORT)
        )
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (arg, None) = (args.next(), args.next()) else {
        return Err("`mcstatus-healthcheck` takes at most one argument.".into());
    };
    let url = target_url(arg, std::env::var("PORT").ok());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let body = client.get(&url).send().await?.error_for_status()?.text().await?;
    if body.trim() != "ok" {
        return Err(format!("{url} answered {body:?}").into());
    }
    println!("Health check succeeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_healthz() {
        assert_eq!(target_url(None, None), "http://127.0.0.1:8080/healthz");
        assert_eq!(
            target_url(None, Some(String::new())),
            "http://127.0.0.1:8080/healthz"
        );
    }

    #[test]
    fn follows_service_port() {
        assert_eq!(
            target_url(None, Some("9000".to_owned())),
            "http://127.0.0.1:9000/healthz"
        );
    }

    #[test]
    fn argument_wins() {
        assert_eq!(
            target_url(Some("http://mcstatus:8080/healthz".to_owned()), Some("9000".to_owned())),
            "http://mcstatus:8080/healthz"
        );
    }
}
