//! gamerelay-protocol – Lobbyprotokoll-Definitionen
//!
//! Dieses Crate definiert den Nachrichtenumschlag `EVENT.payload`, der
//! zwischen Client und Server ausgetauscht wird, sowie die Ablehnungs-,
//! End- und Schliess-Codes.

pub mod codec;
pub mod control;
pub mod error;

pub use codec::{dekodieren, kodieren, Ereignis};
pub use control::{AktionVerweigert, BeitrittVerweigert, EndGrund, SchliessCode};
pub use error::{ProtokollFehler, ProtokollResult};
