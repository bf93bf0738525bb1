//! ABI call builders for the marketplace contracts.
//!
//! The media contract holds the listed assets and their ask records; the
//! auction house contract runs auctions and must be approved per asset
//! before `createAuction` can succeed.

use alloy_primitives::{Address as AlloyAddress, U256};
use alloy_sol_types::{sol, SolCall};
use listing_types::{to_alloy_address, Address, ResolvedIntent, Transaction};

sol! {
	/// Ask record stored by the media contract for a direct purchase.
	struct Ask {
		uint256 amount;
		address currency;
		uint256 sellOnShare;
	}

	interface IMedia {
		function setAsk(uint256 tokenId, Ask memory ask) external;
		function approve(address to, uint256 tokenId) external;
		function getApproved(uint256 tokenId) external view returns (address);
	}

	interface IAuctionHouse {
		function createAuction(
			uint256 tokenId,
			address tokenContract,
			uint256 duration,
			uint256 reservePrice,
			address curator,
			uint8 curatorFeePercentage,
			address auctionCurrency
		) external returns (uint256);
	}
}

/// Builds the `setAsk` transaction for an ask-price listing.
pub fn set_ask(chain_id: u64, media: &Address, intent: &ResolvedIntent) -> Transaction {
	let call = IMedia::setAskCall {
		tokenId: intent.asset_id,
		ask: Ask {
			amount: intent.amount_base_units,
			currency: to_alloy_address(&intent.currency),
			sellOnShare: U256::from(intent.share_of_resale),
		},
	};
	Transaction::new(media.clone(), call.abi_encode(), chain_id)
}

/// Builds the `createAuction` transaction for an auction listing.
///
/// Curated auctions were never part of the product: the curator is pinned to
/// the zero address with a zero fee.
pub fn create_auction(
	chain_id: u64,
	auction_house: &Address,
	token_contract: &Address,
	intent: &ResolvedIntent,
	duration_seconds: u64,
) -> Transaction {
	let call = IAuctionHouse::createAuctionCall {
		tokenId: intent.asset_id,
		tokenContract: to_alloy_address(token_contract),
		duration: U256::from(duration_seconds),
		reservePrice: intent.amount_base_units,
		curator: AlloyAddress::ZERO,
		curatorFeePercentage: 0,
		auctionCurrency: to_alloy_address(&intent.currency),
	};
	Transaction::new(auction_house.clone(), call.abi_encode(), chain_id)
}

/// Builds the `approve` transaction granting the spender control of an asset.
pub fn approve(chain_id: u64, media: &Address, spender: &Address, asset_id: U256) -> Transaction {
	let call = IMedia::approveCall {
		to: to_alloy_address(spender),
		tokenId: asset_id,
	};
	Transaction::new(media.clone(), call.abi_encode(), chain_id)
}

/// Builds the read-only `getApproved` query for an asset.
pub fn get_approved(chain_id: u64, media: &Address, asset_id: U256) -> Transaction {
	let call = IMedia::getApprovedCall { tokenId: asset_id };
	Transaction::new(media.clone(), call.abi_encode(), chain_id)
}

/// Decodes the `getApproved` return value into the approved address.
pub fn decode_approved(data: &[u8]) -> Result<Address, String> {
	IMedia::getApprovedCall::abi_decode_returns(data, true)
		.map(|ret| Address(ret._0.as_slice().to_vec()))
		.map_err(|e| format!("Malformed getApproved response: {}", e))
}
