/// Endpoints for the pull API and the push channel.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub socket_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://connectly-api.onrender.com".to_string(),
            socket_url: "wss://connectly-socket-server.onrender.com/ws".to_string(),
        }
    }
}
