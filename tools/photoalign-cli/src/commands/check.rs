//! Check system capabilities.

use photoalign_capture_engine::get_backend;
use photoalign_platform_linux::permissions::{
    all_required_available, check_capabilities, print_capability_report,
};

pub fn run() -> anyhow::Result<()> {
    println!("Photo Align System Check");
    println!("{}", "=".repeat(50));

    let backend = get_backend();
    if backend.supports_enumeration() {
        println!("[OK] Media backend: {}", backend.name());
    } else {
        println!("[WARN] Media backend: {} (no device enumeration)", backend.name());
    }

    if cfg!(target_os = "linux") {
        let capabilities = check_capabilities();
        println!();
        print_capability_report(&capabilities);

        println!();
        if all_required_available(&capabilities) {
            println!("All required capabilities are available. Photo Align is ready.");
        } else {
            println!("Some required capabilities are missing. See above for fixes.");
        }
    }

    Ok(())
}
