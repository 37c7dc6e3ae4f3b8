//! Transfer Pipeline Module
//!
//! [`TransferContext`] owns every registry, cache and collaborator the
//! engine needs. Hosts build one per configuration and share it.

use crate::balances::{self, BalanceSubscription};
use crate::chains::{Chain, ChainRegistry};
use crate::client::{ApiCache, ApiHandle, ClientManager, ConnectionHandle, Signer, SubmittedTx, TypedClientFactory};
use crate::config::TransferConfig;
use crate::direction::{self, Direction};
use crate::error::{TransferError, TransferResult};
use crate::fees::{self, ConversionRequest, FeeQuote, FeeQuoter};
use crate::storage::{MemoryStorage, Preferences, StorageAdapter};
use crate::tokens::{Token, TokenRegistry};
use crate::utils::AccountId;
use crate::xcm::{self, ExtrinsicCall, Location, XcmTransferParams};
use crate::{log_info, log_warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;


/// A transfer as requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub token: String,
    pub sender: String,
    pub recipient: String,
    pub amount: u128,
    /// Token paying the origin fee; the origin's native token when unset
    #[serde(default)]
    pub fee_token: Option<String>,
}

/// A built, fee-quoted and balance-checked transfer
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTransfer {
    pub from: String,
    pub to: String,
    pub token: String,
    /// `None` for same-chain transfers
    pub direction: Option<Direction>,
    pub call: ExtrinsicCall,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: u128,
    pub fee: FeeQuote,
    pub fee_token: String,
    /// Destination existential deposit of the transferred token
    pub existential_deposit: u128,
}

pub struct TransferContext {
    chains: ChainRegistry,
    tokens: TokenRegistry,
    config: TransferConfig,
    apis: ApiCache,
    storage: Arc<dyn StorageAdapter>,
    quoter: FeeQuoter,
}

impl TransferContext {
    pub fn new(
        chains: ChainRegistry,
        tokens: TokenRegistry,
        config: TransferConfig,
        clients: Arc<ClientManager>,
        factory: Arc<dyn TypedClientFactory>,
    ) -> TransferResult<Self> {
        config.validate()?;
        Ok(Self {
            chains,
            tokens,
            config,
            apis: ApiCache::new(clients, factory),
            storage: Arc::new(MemoryStorage::new()),
            quoter: FeeQuoter::new(),
        })
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = storage;
        self
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Stored preference, falling back to the configured default
    pub fn light_clients_enabled(&self) -> TransferResult<bool> {
        let prefs = Preferences::load(self.storage.as_ref())?;
        Ok(prefs
            .light_clients_enabled
            .unwrap_or(self.config.light_clients_enabled))
    }

    pub fn set_light_clients_enabled(&self, enabled: bool) -> TransferResult<()> {
        let mut prefs = Preferences::load(self.storage.as_ref())?;
        prefs.light_clients_enabled = Some(enabled);
        prefs.save(self.storage.as_ref())
    }

    pub async fn get_client(&self, chain_id: &str) -> TransferResult<Arc<ConnectionHandle>> {
        self.apis
            .clients()
            .get_client(chain_id, self.chains.all(), self.light_clients_enabled()?)
            .await
    }

    pub async fn get_api(&self, chain_id: &str, wait_ready: bool) -> TransferResult<Arc<ApiHandle>> {
        self.apis
            .get_api(chain_id, self.chains.all(), wait_ready, self.light_clients_enabled()?)
            .await
    }

    pub async fn get_token_balance(&self, chain_id: &str, symbol: &str, address: &str) -> TransferResult<u128> {
        let token = self.tokens.get(symbol)?;
        let account = AccountId::parse(address)?;
        let handle = self.get_api(chain_id, true).await?;
        balances::get_token_balance(handle.api.as_ref(), token, &account).await
    }

    pub async fn subscribe_token_balance<F>(
        &self,
        chain_id: &str,
        symbol: &str,
        address: &str,
        on_change: F,
    ) -> TransferResult<BalanceSubscription>
    where
        F: FnMut(u128) + Send + 'static,
    {
        let token = self.tokens.get(symbol)?;
        let account = AccountId::parse(address)?;
        let handle = self.get_api(chain_id, true).await?;
        balances::subscribe_token_balance(handle.api.clone(), token, &account, on_change).await
    }

    pub async fn get_existential_deposit(&self, chain_id: &str, symbol: &str) -> TransferResult<u128> {
        let chain = self.chains.get(chain_id)?;
        let token = self.tokens.get(symbol)?;
        let handle = self.get_api(chain_id, true).await?;
        balances::get_existential_deposit(handle.api.as_ref(), chain, token).await
    }

    pub fn establish_direction(&self, from: &str, to: &str) -> TransferResult<Direction> {
        direction::establish_direction(self.chains.get(from)?, self.chains.get(to)?)
    }

    /// Cross-chain call; needs no connection
    pub fn get_xcm_transfer_extrinsic(
        &self,
        from: &str,
        to: &str,
        symbol: &str,
        recipient: &str,
        plancks: u128,
    ) -> TransferResult<ExtrinsicCall> {
        let origin = self.chains.get(from)?;
        let destination = self.chains.get(to)?;
        let recipient = AccountId::parse(recipient)?;

        xcm::xcm_transfer_extrinsic(&XcmTransferParams {
            direction: direction::establish_direction(origin, destination)?,
            origin,
            destination,
            token: self.tokens.get(symbol)?,
            recipient: &recipient,
            plancks,
        })
    }

    /// Same-chain call; inspects the chain's pallets
    pub async fn get_transfer_extrinsic(
        &self,
        chain_id: &str,
        symbol: &str,
        recipient: &str,
        plancks: u128,
    ) -> TransferResult<ExtrinsicCall> {
        let chain = self.chains.get(chain_id)?;
        let token = self.tokens.get(symbol)?;
        let recipient = AccountId::parse(recipient)?;
        let handle = self.get_api(chain_id, true).await?;
        xcm::transfer_extrinsic(handle.api.as_ref(), chain, token, &recipient, plancks)
    }

    /// Quote `plancks` of `token_in` in `token_out` on `chain_id`
    pub async fn get_asset_convert_plancks(
        &self,
        chain_id: &str,
        plancks: u128,
        token_in: &str,
        token_out: &str,
    ) -> TransferResult<Option<u128>> {
        let chain = self.chains.get(chain_id)?;
        let request = ConversionRequest {
            plancks,
            token_in: self.tokens.get(token_in)?,
            token_out: self.tokens.get(token_out)?,
            native_token: self.native_token(chain)?,
        };
        let handle = self.get_api(chain_id, true).await?;
        fees::get_asset_convert_plancks(handle.api.as_ref(), chain, &request, &self.config.pallet_id()?).await
    }

    pub fn get_fee_asset_location(&self, chain_id: &str, symbol: &str) -> TransferResult<Option<Location>> {
        fees::get_fee_asset_location(self.tokens.get(symbol)?, self.chains.get(chain_id)?)
    }

    /// Build, quote and validate a transfer
    pub async fn prepare_transfer(&self, request: &TransferRequest) -> TransferResult<PreparedTransfer> {
        if request.amount == 0 {
            return Err(TransferError::invalid_input("Transfer amount must be positive"));
        }

        let origin = self.chains.get(&request.from)?;
        let destination = self.chains.get(&request.to)?;
        let token = self.tokens.get(&request.token)?;
        let sender = AccountId::parse(&request.sender)?;
        let recipient = AccountId::parse(&request.recipient)?;
        let native_token = self.native_token(origin)?;
        let fee_token = match &request.fee_token {
            Some(symbol) => self.tokens.get(symbol)?,
            None => native_token,
        };

        let origin_api = self.get_api(&origin.id, true).await?;

        let (direction, call) = if origin.id == destination.id {
            let call = xcm::transfer_extrinsic(origin_api.api.as_ref(), origin, token, &recipient, request.amount)?;
            (None, call)
        } else {
            let direction = direction::establish_direction(origin, destination)?;
            let call = xcm::xcm_transfer_extrinsic(&XcmTransferParams {
                direction,
                origin,
                destination,
                token,
                recipient: &recipient,
                plancks: request.amount,
            })?;
            (Some(direction), call)
        };

        let fee = self
            .quoter
            .quote(
                origin_api.api.as_ref(),
                origin,
                &call,
                &sender,
                fee_token,
                native_token,
                &self.config.pallet_id()?,
            )
            .await?;

        // a fee token without a quote cannot be validated
        let fee_amount = fee
            .fee_in_token
            .ok_or_else(|| TransferError::fee_quote_unavailable(&fee_token.symbol, &origin.id))?;

        self.check_affordable(origin_api.api.as_ref(), token, fee_token, &sender, request.amount, fee_amount)
            .await?;
        let existential_deposit = self
            .check_existential_deposit(destination, token, &recipient, request.amount)
            .await?;

        log_info!(
            "transfer",
            "Transfer prepared",
            from = origin.id,
            to = destination.id,
            token = token.symbol,
            call = call,
            native_fee = fee.native_fee,
        );

        Ok(PreparedTransfer {
            from: origin.id.clone(),
            to: destination.id.clone(),
            token: token.symbol.clone(),
            direction,
            call,
            sender,
            recipient,
            amount: request.amount,
            fee,
            fee_token: fee_token.symbol.clone(),
            existential_deposit,
        })
    }

    /// Whether a prepared transfer still reflects the latest fee request
    pub fn is_current(&self, prepared: &PreparedTransfer) -> bool {
        self.quoter.is_current(&prepared.fee)
    }

    /// Sign and submit a prepared transfer with `signer`
    pub async fn submit(&self, prepared: &PreparedTransfer, signer: &dyn Signer) -> TransferResult<SubmittedTx> {
        if signer.account_id() != prepared.sender {
            return Err(TransferError::invalid_input("Signer does not match the transfer sender"));
        }

        let handle = self.get_api(&prepared.from, true).await?;
        let submitted = handle.api.sign_and_submit(&prepared.call, signer).await?;

        if submitted.ok {
            log_info!("transfer", "Transfer submitted", call = prepared.call, tx = submitted.tx_hash);
        } else {
            log_warn!("transfer", "Transfer dispatch failed", call = prepared.call, tx = submitted.tx_hash);
        }
        Ok(submitted)
    }

    fn native_token(&self, chain: &Chain) -> TransferResult<&Token> {
        self.tokens.get(&chain.native_token).map_err(|_| {
            TransferError::configuration(format!(
                "Native token {} of {} is not registered",
                chain.native_token, chain.id
            ))
        })
    }

    /// Sender must hold the amount, plus the fee when paid in the same token
    async fn check_affordable(
        &self,
        api: &dyn crate::client::TypedApi,
        token: &Token,
        fee_token: &Token,
        sender: &AccountId,
        amount: u128,
        fee_amount: u128,
    ) -> TransferResult<()> {
        let balance = balances::get_token_balance(api, token, sender).await?;
        let same_token = token.symbol == fee_token.symbol;
        let required = if same_token { amount.saturating_add(fee_amount) } else { amount };

        if balance < required {
            return Err(TransferError::insufficient_balance(format!(
                "{} {} available, {} required",
                balance, token.symbol, required
            )));
        }

        if !same_token {
            let fee_balance = balances::get_token_balance(api, fee_token, sender).await?;
            if fee_balance < fee_amount {
                return Err(TransferError::insufficient_balance(format!(
                    "{} {} available for fees, {} required",
                    fee_balance, fee_token.symbol, fee_amount
                )));
            }
        }
        Ok(())
    }

    /// Recipient must end at or above the destination existential deposit
    async fn check_existential_deposit(
        &self,
        destination: &Chain,
        token: &Token,
        recipient: &AccountId,
        amount: u128,
    ) -> TransferResult<u128> {
        let handle = self.get_api(&destination.id, true).await?;
        let api = handle.api.as_ref();

        let (ed, current) = futures::try_join!(
            balances::get_existential_deposit(api, destination, token),
            balances::get_token_balance(api, token, recipient),
        )?;

        if current.saturating_add(amount) < ed {
            return Err(TransferError::below_existential_deposit(format!(
                "{} {} leaves the recipient below the existential deposit of {} on {}",
                amount, token.symbol, ed, destination.id
            )));
        }
        Ok(ed)
    }
}
