//! Participant decision policies.
//!
//! One module per archetype. All policies share the trading capabilities of
//! [`crate::TraderBook`] and differ only in when and how much to trade:
//! - [`NoiseTrader`] - random direction at a fixed activity rate
//! - [`MomentumTrader`] - moving-average crossover plus retail sentiment
//! - [`FundamentalTrader`] - RSI mean reversion
//! - [`RetailInvestor`] - opinion-network trading
//! - [`Initiator`] - broadcasts the squeeze sentiment, never trades
//! - [`HedgeFund`] - scripted short campaign
//! - [`MarketMaker`] - imbalance compensation and option writing

mod fundamental;
mod hedge_fund;
mod initiator;
mod market_maker;
mod momentum;
mod noise;
mod retail;

pub use fundamental::{FundamentalTrader, FundamentalTraderConfig};
pub use hedge_fund::{CampaignState, HedgeFund, HedgeFundConfig};
pub use initiator::{Initiator, InitiatorConfig};
pub use market_maker::{MarketMaker, MarketMakerConfig};
pub use momentum::{MomentumTrader, MomentumTraderConfig};
pub use noise::{NoiseTrader, NoiseTraderConfig};
pub use retail::{RetailInvestor, RetailInvestorConfig};
