use std::env;

use lineup_core::WrongGuessPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_timeout_minutes: u64,
    pub connection_timeout_seconds: u64,
    pub wrong_guess_policy: WrongGuessPolicy,
    pub single_elimination_per_turn: bool,
    pub image_host_url: Option<String>,
    pub image_host_api_key: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            session_timeout_minutes: env::var("SESSION_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "240".to_string())
                .parse()
                .expect("Invalid SESSION_TIMEOUT_MINUTES"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
            wrong_guess_policy: match env::var("WRONG_GUESS_POLICY")
                .unwrap_or_else(|_| "cross-and-pass".to_string())
                .as_str()
            {
                "sudden-death" => WrongGuessPolicy::SuddenDeath,
                "cross-and-pass" => WrongGuessPolicy::CrossAndPass,
                other => panic!("Invalid WRONG_GUESS_POLICY: {other}"),
            },
            single_elimination_per_turn: env::var("SINGLE_ELIMINATION_PER_TURN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .expect("Invalid SINGLE_ELIMINATION_PER_TURN"),
            image_host_url: env::var("IMAGE_HOST_URL").ok(),
            image_host_api_key: env::var("IMAGE_HOST_API_KEY").ok(),
        }
    }

    pub fn rules(&self) -> lineup_core::SessionRules {
        lineup_core::SessionRules {
            wrong_guess_policy: self.wrong_guess_policy,
            single_elimination_per_turn: self.single_elimination_per_turn,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
