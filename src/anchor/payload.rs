/// OP_RETURN anchor payload decoding.
///
/// Two historical conventions embed a Merkle root in an OP_RETURN
/// output:
///
/// - Legacy: `OP_RETURN | len | <7-byte text prefix> | <hash bytes>`
/// - Meta-protocol: `OP_RETURN | len | "CRED" | version(2B) | command(2B)
///   | issuerId(8B) | hash hex re-encoded as ASCII`
///
/// Dispatch is on the `CRED` magic, letting one verifier accept receipts
/// anchored under either convention. All offsets below are in hex
/// characters, since indexer APIs hand scripts around as hex strings.
use crate::error::{ChainpointError, Result};

/// OP_RETURN opcode, hex-encoded.
const OP_RETURN_HEX: &str = "6a";

/// OP_PUSHDATA1 marker, hex-encoded.
const OP_PUSHDATA1_HEX: &str = "4c";

/// Meta-protocol magic: the ASCII bytes "CRED", hex-encoded.
const META_MAGIC_HEX: &str = "43524544";

/// Hex chars occupied by the meta-protocol version field (2 bytes).
const META_VERSION_HEX_LEN: usize = 4;

/// Hex chars occupied by the meta-protocol command field (2 bytes).
const META_COMMAND_HEX_LEN: usize = 4;

/// Hex chars occupied by the meta-protocol issuer id (8 bytes).
const META_ISSUER_HEX_LEN: usize = 16;

/// Hex chars occupied by the whole meta-protocol header.
const META_HEADER_HEX_LEN: usize =
    META_MAGIC_HEX.len() + META_VERSION_HEX_LEN + META_COMMAND_HEX_LEN + META_ISSUER_HEX_LEN;

/// Default legacy prefix width: 7 bytes of text before the hash.
const LEGACY_PREFIX_HEX_LEN: usize = 14;

/// Which convention an anchor payload was decoded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorFormat {
    LegacyPrefix,
    MetaProtocol,
}

/// A decoded anchor payload: the recovered hash plus its convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAnchor {
    pub format: AnchorFormat,
    /// The anchored hash as lowercase hex text.
    pub hash_hex: String,
}

/// The decomposed meta-protocol payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProtocolPayload {
    pub version: u16,
    pub command: u16,
    /// Issuer id as 8 raw bytes.
    pub issuer_id: [u8; 8],
    /// The anchored hash as hex text.
    pub hash_hex: String,
}

/// Extract the data payload from an OP_RETURN output script.
///
/// The script must begin with the OP_RETURN opcode. A short payload is
/// preceded by a single length byte; payloads over 75 bytes use an
/// OP_PUSHDATA1 marker followed by the length byte. The choice is made
/// solely on whether the byte after the opcode is `4c`.
pub fn extract_op_return(script_hex: &str) -> Result<&str> {
    let script = ascii_hex(script_hex)?;
    if script.len() < 2 || !script[..2].eq_ignore_ascii_case(OP_RETURN_HEX) {
        return Err(ChainpointError::NoDataPayload);
    }

    // opcode + length byte, or opcode + pushdata1 marker + length byte
    let skip = if script.len() >= 4 && script[2..4].eq_ignore_ascii_case(OP_PUSHDATA1_HEX) {
        6
    } else {
        4
    };

    if script.len() <= skip {
        return Err(ChainpointError::MalformedAnchorPayload(
            "script ends before any data bytes".to_string(),
        ));
    }
    Ok(&script[skip..])
}

/// Decode a legacy fixed-prefix payload.
///
/// Strips the leading prefix (7 bytes unless an explicit `prefix` text
/// is supplied) and returns the remainder as the anchored hash hex.
pub fn decode_legacy(payload_hex: &str, prefix: Option<&str>) -> Result<DecodedAnchor> {
    let payload_hex = ascii_hex(payload_hex)?;
    let prefix_hex_len = match prefix {
        Some(text) => text.len() * 2,
        None => LEGACY_PREFIX_HEX_LEN,
    };

    if payload_hex.len() <= prefix_hex_len {
        return Err(ChainpointError::MalformedAnchorPayload(format!(
            "payload of {} hex chars is no longer than its {} char prefix",
            payload_hex.len(),
            prefix_hex_len
        )));
    }

    Ok(DecodedAnchor {
        format: AnchorFormat::LegacyPrefix,
        hash_hex: payload_hex[prefix_hex_len..].to_ascii_lowercase(),
    })
}

/// Decode a structured meta-protocol payload.
///
/// Layout after the `CRED` magic: version (2 bytes), command (2 bytes),
/// issuer id (8 bytes), then the anchored hash. The hash travels as its
/// textual hex representation re-encoded as ASCII, so the tail is
/// hex-decoded to bytes and read back as UTF-8 text to recover the hash
/// string. That double-hex convention is how the anchoring tool wrote
/// it; it is preserved bit-exactly here.
pub fn decode_meta_protocol(payload_hex: &str) -> Result<MetaProtocolPayload> {
    let payload = ascii_hex(payload_hex)?;
    if payload.len() <= META_HEADER_HEX_LEN {
        return Err(ChainpointError::MalformedAnchorPayload(format!(
            "meta-protocol payload of {} hex chars is shorter than the {} char header",
            payload.len(),
            META_HEADER_HEX_LEN
        )));
    }
    if !payload[..META_MAGIC_HEX.len()].eq_ignore_ascii_case(META_MAGIC_HEX) {
        return Err(ChainpointError::MalformedAnchorPayload(
            "payload does not start with the CRED magic".to_string(),
        ));
    }

    let mut offset = META_MAGIC_HEX.len();
    let version = parse_hex_u16(&payload[offset..offset + META_VERSION_HEX_LEN])?;
    offset += META_VERSION_HEX_LEN;
    let command = parse_hex_u16(&payload[offset..offset + META_COMMAND_HEX_LEN])?;
    offset += META_COMMAND_HEX_LEN;

    let issuer_bytes = hex::decode(&payload[offset..offset + META_ISSUER_HEX_LEN])
        .map_err(|e| ChainpointError::MalformedAnchorPayload(format!("bad issuer id hex: {e}")))?;
    let issuer_id: [u8; 8] = issuer_bytes
        .try_into()
        .expect("16 hex chars decode to 8 bytes");
    offset += META_ISSUER_HEX_LEN;

    let hash_bytes = hex::decode(&payload[offset..])
        .map_err(|e| ChainpointError::MalformedAnchorPayload(format!("bad hash hex: {e}")))?;
    let hash_hex = String::from_utf8(hash_bytes).map_err(|_| {
        ChainpointError::MalformedAnchorPayload("hash bytes are not UTF-8 text".to_string())
    })?;

    Ok(MetaProtocolPayload {
        version,
        command,
        issuer_id,
        hash_hex,
    })
}

/// Decode an anchor payload under whichever convention it was written.
///
/// Payloads starting with the `CRED` magic are meta-protocol; everything
/// else is treated as legacy fixed-prefix.
pub fn decode_anchor(payload_hex: &str) -> Result<DecodedAnchor> {
    let payload = ascii_hex(payload_hex)?;
    if payload.len() >= META_MAGIC_HEX.len()
        && payload[..META_MAGIC_HEX.len()].eq_ignore_ascii_case(META_MAGIC_HEX)
    {
        let meta = decode_meta_protocol(payload)?;
        Ok(DecodedAnchor {
            format: AnchorFormat::MetaProtocol,
            hash_hex: meta.hash_hex,
        })
    } else {
        decode_legacy(payload, None)
    }
}

fn parse_hex_u16(hex_chars: &str) -> Result<u16> {
    u16::from_str_radix(hex_chars, 16)
        .map_err(|e| ChainpointError::MalformedAnchorPayload(format!("bad header field: {e}")))
}

/// Trim and require ASCII so hex-char offsets index safely.
fn ascii_hex(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if !trimmed.is_ascii() {
        return Err(ChainpointError::MalformedAnchorPayload(
            "payload hex contains non-ASCII characters".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "7075152d03a5cd92104887b476862778ec0c87be5c2fa1c0a90f87c49fad6eff";

    /// "CRED" + version 0x0001 + command 0x0001 + issuer 00000000deadbeef
    /// + ROOT as ASCII hex text, hex-encoded again.
    fn meta_payload() -> String {
        format!(
            "{}{}{}{}{}",
            "43524544",
            "0001",
            "0001",
            "00000000deadbeef",
            hex::encode(ROOT.as_bytes())
        )
    }

    /// 7-byte prefix "BCPROOF" + raw root bytes.
    fn legacy_payload() -> String {
        format!("{}{}", hex::encode(b"BCPROOF"), ROOT)
    }

    #[test]
    fn test_extract_short_form() {
        let script = format!("6a27{}", legacy_payload());
        assert_eq!(extract_op_return(&script).unwrap(), legacy_payload());
    }

    #[test]
    fn test_extract_pushdata1_form() {
        let script = format!("6a4c50{}", meta_payload());
        assert_eq!(extract_op_return(&script).unwrap(), meta_payload());
    }

    #[test]
    fn test_extract_dispatch_is_on_pushdata1_marker_only() {
        // Same payload behind both encodings: the skip width must depend
        // solely on whether the byte after 6a is 4c.
        let payload = meta_payload();
        let short = format!("6a50{payload}");
        let long = format!("6a4c50{payload}");
        assert_eq!(extract_op_return(&short).unwrap(), payload);
        assert_eq!(extract_op_return(&long).unwrap(), payload);
    }

    #[test]
    fn test_extract_rejects_non_op_return() {
        // P2PKH script: OP_DUP OP_HASH160 ...
        assert!(matches!(
            extract_op_return("76a914000000000000000000000000000000000000000088ac"),
            Err(ChainpointError::NoDataPayload)
        ));
    }

    #[test]
    fn test_extract_rejects_empty_data() {
        assert!(matches!(
            extract_op_return("6a00"),
            Err(ChainpointError::MalformedAnchorPayload(_))
        ));
    }

    #[test]
    fn test_decode_legacy_default_prefix() {
        let decoded = decode_legacy(&legacy_payload(), None).unwrap();
        assert_eq!(decoded.format, AnchorFormat::LegacyPrefix);
        assert_eq!(decoded.hash_hex, ROOT);
    }

    #[test]
    fn test_decode_legacy_explicit_prefix() {
        // A 9-byte prefix overrides the default 7-byte offset.
        let payload = format!("{}{}", hex::encode(b"PROOFMARK"), ROOT);
        let decoded = decode_legacy(&payload, Some("PROOFMARK")).unwrap();
        assert_eq!(decoded.hash_hex, ROOT);
    }

    #[test]
    fn test_decode_legacy_too_short() {
        assert!(matches!(
            decode_legacy("6a6a6a", None),
            Err(ChainpointError::MalformedAnchorPayload(_))
        ));
    }

    #[test]
    fn test_decode_meta_protocol() {
        let meta = decode_meta_protocol(&meta_payload()).unwrap();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.command, 1);
        assert_eq!(meta.issuer_id, [0, 0, 0, 0, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(meta.hash_hex, ROOT);
    }

    #[test]
    fn test_decode_meta_protocol_header_too_short() {
        // Magic plus a truncated header.
        assert!(matches!(
            decode_meta_protocol("4352454400010001"),
            Err(ChainpointError::MalformedAnchorPayload(_))
        ));
    }

    #[test]
    fn test_decode_meta_protocol_non_utf8_tail() {
        let payload = format!("{}{}{}{}{}", "43524544", "0001", "0001", "00000000deadbeef", "ff");
        assert!(matches!(
            decode_meta_protocol(&payload),
            Err(ChainpointError::MalformedAnchorPayload(_))
        ));
    }

    #[test]
    fn test_dispatch_meta_never_legacy() {
        // A CRED-tagged payload must route to the meta-protocol decoder:
        // the result is the double-hex-decoded tail, not a prefix strip.
        let decoded = decode_anchor(&meta_payload()).unwrap();
        assert_eq!(decoded.format, AnchorFormat::MetaProtocol);
        assert_eq!(decoded.hash_hex, ROOT);
    }

    #[test]
    fn test_dispatch_legacy_never_meta() {
        let decoded = decode_anchor(&legacy_payload()).unwrap();
        assert_eq!(decoded.format, AnchorFormat::LegacyPrefix);
        assert_eq!(decoded.hash_hex, ROOT);
    }

    #[test]
    fn test_end_to_end_script_to_hash() {
        let script = format!("6a4c50{}", meta_payload());
        let payload = extract_op_return(&script).unwrap();
        let decoded = decode_anchor(payload).unwrap();
        assert_eq!(decoded.hash_hex, ROOT);
    }

    #[test]
    fn test_uppercase_script_accepted() {
        let script = format!("6A27{}", legacy_payload().to_ascii_uppercase());
        let payload = extract_op_return(&script).unwrap();
        let decoded = decode_anchor(payload).unwrap();
        assert_eq!(decoded.hash_hex, ROOT);
    }
}
