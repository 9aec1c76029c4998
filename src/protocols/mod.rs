//! Typed clients for individual Solana protocols.
//!
//! Every client is built from a [`Config`](crate::Config), accepts a custom base
//! URL through `with_url`, classifies failures into
//! [`ErrorKind`](crate::ErrorKind) and implements
//! [`ProtocolAdapter`](crate::adapter::ProtocolAdapter).
//!
//! | Module | Upstream | Component name |
//! |---|---|---|
//! | [`solana`] | Solana JSON-RPC | `connection` |
//! | [`jupiter`] | Jupiter swap API | `jupiter` |
//! | [`pyth`] | Pyth Hermes | `pyth` |
//! | [`kamino`] | Kamino lending API | `kamino` |
//! | [`marinade`] | Marinade API | `marinade` |
//! | [`drift`] | Drift data API | `drift` |
//! | [`magiceden`] | Magic Eden API | `magiceden` |
//! | [`wormhole`] | Wormholescan | `wormhole` |
//! | [`privacy`] | Privacy-transfer relayer | `privacy` |

pub mod drift;
pub mod jupiter;
pub mod kamino;
pub mod magiceden;
pub mod marinade;
pub mod privacy;
pub mod pyth;
pub mod solana;
pub mod tokens;
pub mod wormhole;
