use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiotApiError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Decoding raw response error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Still rate limited by Riot after {attempts} attempts")]
    RateLimited { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum RiotMatchError {
    #[error(transparent)]
    Api(#[from] RiotApiError),

    #[error("The requested puuid is not part of match {match_id}")]
    PuuidNotInMatch { match_id: String },
}

/// A call to Riot API can either result in a success with the success type or fail with a [`RiotApiError`].
pub type RiotApiResponse<T> = Result<T, RiotApiError>;
