use crate::app::server::HEALTH_PATH;
use crate::utils::error::Result;
use crate::utils::validation::validate_url;
use std::net::IpAddr;
use std::time::Duration;

/// 綁定在萬用位址時改連本機迴路
pub fn health_url(address: &str, port: u16) -> String {
    let host = match address.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() && ip.is_ipv6() => "[::1]".to_string(),
        Ok(ip) if ip.is_unspecified() => "127.0.0.1".to_string(),
        Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
        Ok(IpAddr::V4(ip)) => ip.to_string(),
        Err(_) => address.to_string(),
    };
    format!("http://{}:{}{}", host, port, HEALTH_PATH)
}

/// 健康檢查：非 2xx 或連線失敗皆視為不健康
pub async fn probe_health(url: &str, timeout: Duration) -> Result<String> {
    validate_url("health_url", url)?;

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}
