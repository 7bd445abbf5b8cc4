//! Example demonstrating Yubico validation client tracing instrumentation.
//!
//! Run with:
//! YUBICO_CLIENT_ID=... YUBICO_SECRET_KEY=... \
//!     cargo run -p otpgate-core --example yubico_tracing -- <otp>

use std::time::Duration;

use otpgate_core::yubikey::{
    OtpVerifier, Verdict, YubicoClient, YubicoClientConfig, YubikeyCredentials,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("otpgate_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Yubico Validation Tracing Demo ===\n");

    let Some(otp) = std::env::args().nth(1) else {
        eprintln!("Usage: yubico_tracing <otp>");
        return;
    };

    let credentials = YubikeyCredentials::new(
        std::env::var("YUBICO_CLIENT_ID").unwrap_or_default(),
        std::env::var("YUBICO_SECRET_KEY").unwrap_or_default(),
    );
    println!("Credentials: {:?}\n", credentials);

    let config = YubicoClientConfig {
        timeout: Duration::from_secs(10),
        ..Default::default()
    };

    let client = match YubicoClient::with_config(&credentials, config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    println!("\nValidating OTP...\n");

    match client.verify(&otp).await {
        Ok(Verdict::Accepted) => println!("\nOTP accepted"),
        Ok(Verdict::Rejected) => println!("\nOTP rejected"),
        Err(e) => println!("\nValidation error: {}", e),
    }
}
