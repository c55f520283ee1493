pub mod verify;

pub use verify::{Report, Verdict, Verifier};
