//! Schema command handler.

use crate::error::RegistryResult;
use crate::schema::server_schema_text;

/// Print the bundled server document schema.
pub async fn print_schema() -> RegistryResult<()> {
    println!("{}", server_schema_text().trim_end());
    Ok(())
}
