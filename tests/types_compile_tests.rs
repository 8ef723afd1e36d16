// ABOUTME: Trybuild runner for the crate's public type surface.
// ABOUTME: Checks that downstream code can use the sealed engine traits generically.

#[test]
fn engine_traits_usable_as_bounds() {
    let t = trybuild::TestCases::new();
    t.pass("tests/compile_pass/generic_engine.rs");
}
