use std::net::Ipv4Addr;

const SWEEP_PORT: &str = "SWEEP_PORT";

const DEFAULT_PORT: u16 = 3000;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(SWEEP_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const SWEEP_ADDR: &str = "SWEEP_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    let addr_from_env = std::env::var(SWEEP_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

const INTERNAL_SECRET: &str = "INTERNAL_SECRET";

pub fn get_secret() -> Option<String> {
    non_empty_var(INTERNAL_SECRET)
}

const SLACK_DOWN_WEBHOOK: &str = "SLACK_DOWN_WEBHOOK";

pub fn get_down_webhook() -> Option<String> {
    non_empty_var(SLACK_DOWN_WEBHOOK)
}

const SLACK_UP_WEBHOOK: &str = "SLACK_UP_WEBHOOK";

pub fn get_up_webhook() -> Option<String> {
    non_empty_var(SLACK_UP_WEBHOOK)
}

const APP_URL: &str = "APP_URL";

pub fn get_app_url() -> Option<String> {
    non_empty_var(APP_URL)
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
