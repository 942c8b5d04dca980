use anyhow::Result;

#[derive(Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let storage = StorageConfig {
            event_buffer: env_or("STORE_EVENT_BUFFER", 64)?,
        };
        let session = SessionConfig {
            ticker_interval_secs: env_or("SESSION_TICKER_INTERVAL_SECS", 30)?,
        };
        Ok(Self { storage, session })
    }
}

#[derive(Clone)]
pub struct StorageConfig {
    pub event_buffer: usize,
}

#[derive(Clone)]
pub struct SessionConfig {
    // セッション時間帯の再分類周期。クロックだけが変化する入力なので
    // この周期でゲートを回し直す
    pub ticker_interval_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => Ok(v.parse::<T>()?),
    }
}
