//! Transaction message construction

use crate::error::{ChainError, ChainResult};
use crate::wallet::SubaccountInfo;
use cosmrs::{bank::MsgSend, tx::Msg, AccountId, Any, Coin, Denom};
use prost::Message;

pub const TYPE_URL_MSG_DEPOSIT_TO_SUBACCOUNT: &str = "/dydxprotocol.sending.MsgDepositToSubaccount";

/// Identifies a subaccount on a dYdX chain
#[derive(Clone, PartialEq, Message)]
pub struct SubaccountId {
    #[prost(string, tag = "1")]
    pub owner: String,
    #[prost(uint32, tag = "2")]
    pub number: u32,
}

/// `dydxprotocol.sending.MsgDepositToSubaccount`
#[derive(Clone, PartialEq, Message)]
pub struct MsgDepositToSubaccount {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(message, optional, tag = "2")]
    pub recipient: Option<SubaccountId>,
    #[prost(uint32, tag = "3")]
    pub asset_id: u32,
    #[prost(uint64, tag = "4")]
    pub quantums: u64,
}

/// Parse a bech32 address and require the sender's prefix
fn parse_recipient(address: &str, sender: &AccountId) -> ChainResult<AccountId> {
    let account: AccountId = address
        .parse()
        .map_err(|e| ChainError::InvalidAddress(format!("{}: {}", address, e)))?;

    if account.prefix() != sender.prefix() {
        return Err(ChainError::InvalidAddress(format!(
            "{}: expected prefix {}, got {}",
            address,
            sender.prefix(),
            account.prefix()
        )));
    }

    Ok(account)
}

/// Build a deposit from `sender`'s wallet into the recipient subaccount
pub fn deposit_to_subaccount(
    sender: &SubaccountInfo,
    recipient: SubaccountId,
    asset_id: u32,
    quantums: u64,
) -> ChainResult<Any> {
    parse_recipient(&recipient.owner, sender.address())?;

    let msg = MsgDepositToSubaccount {
        sender: sender.address().to_string(),
        recipient: Some(recipient),
        asset_id,
        quantums,
    };

    Ok(Any {
        type_url: TYPE_URL_MSG_DEPOSIT_TO_SUBACCOUNT.to_string(),
        value: msg.encode_to_vec(),
    })
}

/// Build a bank transfer of `amount` base units of `denom`
pub fn send_token(
    sender: &SubaccountInfo,
    recipient: &str,
    denom: &str,
    amount: u128,
) -> ChainResult<Any> {
    let to_address = parse_recipient(recipient, sender.address())?;

    let denom: Denom = denom
        .parse()
        .map_err(|e| ChainError::InvalidMessage(format!("Invalid denom {}: {}", denom, e)))?;

    let msg = MsgSend {
        from_address: sender.address().clone(),
        to_address,
        amount: vec![Coin { denom, amount }],
    };

    msg.to_any()
        .map_err(|e| ChainError::InvalidMessage(e.to_string()))
}
