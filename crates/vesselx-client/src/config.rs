/// Where the client points. The gateway URL is normally derived from the API
/// URL by swapping the scheme and appending the gateway path.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub gateway_url: String,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        let gateway_url = gateway_url_for(&api_url);
        Self {
            api_url,
            gateway_url,
        }
    }

    /// Read `VESSELX_API_URL` (and optionally `VESSELX_GATEWAY_URL`) from the
    /// environment, defaulting to a local dev server.
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("VESSELX_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
        let gateway_url =
            std::env::var("VESSELX_GATEWAY_URL").unwrap_or_else(|_| gateway_url_for(&api_url));
        Self {
            api_url,
            gateway_url,
        }
    }
}

/// `https://` becomes `wss://`, `http://` becomes `ws://`; bare hosts get
/// `ws://`. The gateway always lives at `/gateway`.
fn gateway_url_for(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{base}")
    };
    format!("{ws}/gateway")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_url_swaps_scheme() {
        assert_eq!(
            gateway_url_for("https://api.vesselx.app"),
            "wss://api.vesselx.app/gateway"
        );
        assert_eq!(
            gateway_url_for("http://127.0.0.1:3000/"),
            "ws://127.0.0.1:3000/gateway"
        );
        assert_eq!(
            gateway_url_for("localhost:3000"),
            "ws://localhost:3000/gateway"
        );
    }
}
