//! Contract bindings for the RegenThemFund factory and fund contracts.

use alloy_primitives::B256;
use alloy_sol_types::{SolEvent, sol};
use regen_sdk::objects::FundEvent;

use super::ChainError;
use super::rpc::RpcLog;
use crate::events::FundCreated;
use crate::utils::units::format_token_amount;

sol! {
    interface IRegenThemFundFactory {
        event RegenThemFundCreated(
            address indexed owner,
            address regenThemFundAddress,
            string name,
            uint256 goalAmount
        );

        function getRegenThemFundContracts() external view returns (address[] memory);
    }

    interface IRegenThemFund {
        function getName() external view returns (string memory);
        function getDescription() external view returns (string memory);
        function getGoalAmount() external view returns (uint256);
        function getCurrentBalance() external view returns (uint256);
        function getTotalRaised() external view returns (uint256);
        function getProgress() external view returns (uint256);
        function getOwner() external view returns (address);
    }
}

/// Topic0 of `RegenThemFundCreated`.
pub fn fund_created_topic() -> B256 {
    IRegenThemFundFactory::RegenThemFundCreated::SIGNATURE_HASH
}

/// Decode a factory log into a [`FundCreated`] event.
pub fn decode_fund_created(log: &RpcLog) -> Result<FundCreated, ChainError> {
    let decoded = IRegenThemFundFactory::RegenThemFundCreated::decode_raw_log(
        log.topics.iter().copied(),
        &log.data,
        true,
    )?;

    Ok(FundCreated {
        event: FundEvent {
            owner: decoded.owner.to_checksum(None),
            address: decoded.regenThemFundAddress.to_checksum(None),
            name: decoded.name,
            goal: format_token_amount(decoded.goalAmount),
        },
        block_number: log.block_number(),
        transaction_hash: log.transaction_hash,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};

    fn encoded_log(goal: U256) -> RpcLog {
        let event = IRegenThemFundFactory::RegenThemFundCreated {
            owner: address!("1111111111111111111111111111111111111111"),
            regenThemFundAddress: address!("2222222222222222222222222222222222222222"),
            name: "Urban Orchards".to_string(),
            goalAmount: goal,
        };
        let data = event.encode_log_data();
        RpcLog {
            address: crate::chain::FACTORY_ADDRESS,
            topics: data.topics().to_vec(),
            data: data.data.clone(),
            block_number: Some("0x1b4".to_string()),
            transaction_hash: None,
        }
    }

    #[test]
    fn test_decode_fund_created() {
        let goal = U256::from(1500u64) * U256::from(10u64).pow(U256::from(18u64));
        let created = decode_fund_created(&encoded_log(goal)).unwrap();

        assert_eq!(created.event.name, "Urban Orchards");
        assert_eq!(
            created.event.owner,
            "0x1111111111111111111111111111111111111111"
        );
        assert_eq!(
            created.event.address,
            "0x2222222222222222222222222222222222222222"
        );
        assert_eq!(created.event.goal, "1500.0");
        assert_eq!(created.block_number, Some(436));
    }

    #[test]
    fn test_decode_rejects_foreign_topic() {
        let mut log = encoded_log(U256::from(1u64));
        log.topics[0] = B256::ZERO;
        assert!(decode_fund_created(&log).is_err());
    }

    #[test]
    fn test_topic_matches_event_signature() {
        assert_eq!(
            fund_created_topic(),
            alloy_primitives::keccak256("RegenThemFundCreated(address,address,string,uint256)")
        );
    }
}
