// ── Domain model ──
//
// Canonical representation of the records the directory shows. Every
// consumer (CLI/TUI) depends on these types, never on raw JSON.

pub mod company;

pub use company::Company;
