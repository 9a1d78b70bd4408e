use std::sync::OnceLock;

use crate::gpu::Gpu;

/// Shared GPU for tests, or `None` on headless systems.
pub fn test_gpu() -> Option<Gpu> {
    static GPU: OnceLock<Option<Gpu>> = OnceLock::new();
    GPU.get_or_init(|| match Gpu::new() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("GPU unavailable (expected on headless systems): {}", e);
            None
        }
    })
    .clone()
}
