/// Build helper. Everything is handled by nih_plug_xtask:
///
///   cargo xtask bundle loveless-zone-delay --release
///
/// produces the `.vst3` and `.clap` bundles under `target/bundled/`. The
/// AUv2 component comes from the `clap_wrapper::export_auv2!()` entry point
/// in the same library.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
