use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::FetchConfig;

pub fn build_http_client(cfg: &FetchConfig) -> Result<Client> {
    Client::builder()
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent.clone())
        .build()
        .context("failed to build http client")
}
