// Assertion helpers shared by the unit and integration tests. Not part of the
// documented API.
#[doc(hidden)]
pub mod testing;
