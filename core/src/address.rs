use alloy_primitives::Address;

/// Parse a recipient as a `0x`-prefixed 20-byte hex address.
///
/// All-lowercase and all-uppercase hex are accepted as-is. Mixed-case input is
/// treated as an EIP-55 checksum and must match it exactly.
pub fn parse_address(input: &str) -> Result<Address, String> {
    let input = input.trim();
    let address = parse_address_unchecked(input)?;

    let hex = &input[2..];
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None) != input {
        return Err(format!("Invalid address '{input}': bad checksum."));
    }

    Ok(address)
}

/// Shape-only parse: `0x` prefix and 40 hex characters, letter case ignored.
pub fn parse_address_unchecked(input: &str) -> Result<Address, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Recipient cannot be empty.".to_string());
    }

    let Some(hex) = input.strip_prefix("0x") else {
        return Err(format!("Invalid address '{input}': missing 0x prefix."));
    };
    if hex.len() != 40 {
        return Err(format!(
            "Invalid address '{input}': expected 40 hex characters, got {}.",
            hex.len()
        ));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid address '{input}': non-hex characters."));
    }

    input
        .parse::<Address>()
        .map_err(|e| format!("Invalid address '{input}': {e}"))
}
