use crate::types::{
    BlockCandidate, CandidateSet, ChainResponse, MiningOutcome, MiningSubmission,
    TransactionRequest, WalletKeys,
};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Everything the client needs from the chain server.
#[async_trait]
pub trait ChainService: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<BlockCandidate>, Error>;

    async fn fetch_difficulty(&self) -> Result<u32, Error>;

    /// Non-success statuses are a [`MiningOutcome::Rejected`], only a
    /// missing response is an error.
    async fn submit(&self, submission: &MiningSubmission) -> Result<MiningOutcome, Error>;

    async fn fetch_transactions(&self) -> Result<Vec<Value>, Error>;

    /// `query` is the output of [`crate::filter::ChainFilter::build_query`].
    async fn fetch_chain(&self, query: &str) -> Result<Vec<Value>, Error>;

    async fn generate_wallet(&self) -> Result<WalletKeys, Error>;

    async fn sign_transaction(&self, request: &TransactionRequest) -> Result<Value, Error>;

    async fn broadcast_transaction(&self, transaction: &Value) -> Result<String, Error>;
}

#[derive(Clone, Debug)]
pub struct HttpChainService {
    client: reqwest::Client,
    base: Url,
}

impl HttpChainService {
    pub fn new(server: &str) -> Result<Self, Error> {
        let mut base = Url::parse(server)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path)?)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!(target: "toychain::client", %url, "GET");
        let response = self.client.get(url).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ChainService for HttpChainService {
    async fn fetch_candidates(&self) -> Result<Vec<BlockCandidate>, Error> {
        let set: CandidateSet = self.get(self.endpoint("api/mine")?).await?.json().await?;
        Ok(set.blocks)
    }

    async fn fetch_difficulty(&self) -> Result<u32, Error> {
        let text = self
            .get(self.endpoint("api/mine/difficulty")?)
            .await?
            .text()
            .await?;
        let parsed: Result<u32, _> = text.trim().parse();
        match parsed {
            Ok(difficulty) => Ok(difficulty),
            Err(_) => Err(Error::InvalidDifficulty(text)),
        }
    }

    async fn submit(&self, submission: &MiningSubmission) -> Result<MiningOutcome, Error> {
        let url = self.endpoint("api/mine")?;
        debug!(
            target: "toychain::client",
            %url,
            block = %submission.block_id,
            nonce = %submission.nonce,
            "POST"
        );
        let response = self.client.post(url).json(submission).send().await?;
        let status = response.status();
        let server_message = response.text().await?;
        if status.is_success() {
            Ok(MiningOutcome::Accepted { server_message })
        } else {
            Ok(MiningOutcome::Rejected {
                status_code: status.as_u16(),
                server_message,
            })
        }
    }

    async fn fetch_transactions(&self) -> Result<Vec<Value>, Error> {
        let url = self.endpoint("api/transactions")?;
        Ok(self.get(url).await?.json().await?)
    }

    async fn fetch_chain(&self, query: &str) -> Result<Vec<Value>, Error> {
        let mut url = self.endpoint("api/chain")?;
        url.set_query(query.strip_prefix('?'));
        let chain: ChainResponse = self.get(url).await?.json().await?;
        Ok(chain.blocks)
    }

    async fn generate_wallet(&self) -> Result<WalletKeys, Error> {
        let url = self.endpoint("api/wallet/new")?;
        Ok(self.get(url).await?.json().await?)
    }

    async fn sign_transaction(&self, request: &TransactionRequest) -> Result<Value, Error> {
        let url = self.endpoint("api/transaction/sign")?;
        debug!(target: "toychain::client", %url, "POST");
        let response = self.client.post(url).form(request).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn broadcast_transaction(&self, transaction: &Value) -> Result<String, Error> {
        let url = self.endpoint("api/transaction/broadcast")?;
        debug!(target: "toychain::client", %url, "POST");
        let response = self.client.post(url).json(transaction).send().await?;
        Ok(ensure_success(response).await?.text().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url")]
    Url(#[from] url::ParseError),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid difficulty {0:?}")]
    InvalidDifficulty(String),
}
