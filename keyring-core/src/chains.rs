/// CAIP-2 namespace of EVM chains.
pub const EVM_NAMESPACE: &str = "eip155";

/// Whether `chain` is a CAIP-2 EVM chain id such as `eip155:1`.
#[must_use]
pub fn is_evm_chain(chain: &str) -> bool {
    chain
        .split_once(':')
        .is_some_and(|(namespace, reference)| {
            namespace == EVM_NAMESPACE
                && !reference.is_empty()
                && reference.bytes().all(|b| b.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_evm_chain() {
        assert!(is_evm_chain("eip155:1"));
        assert!(is_evm_chain("eip155:11155111"));
        assert!(!is_evm_chain("eip155:"));
        assert!(!is_evm_chain("eip155:0x1"));
        assert!(!is_evm_chain("bip122:000000000019d6689c085ae165831e93"));
        assert!(!is_evm_chain("1"));
    }
}
