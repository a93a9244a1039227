use anyhow::Result;

use textportal_core::serve::encode_trigger_payload;

pub fn run() -> Result<()> {
    println!("{}", encode_trigger_payload()?);
    Ok(())
}
