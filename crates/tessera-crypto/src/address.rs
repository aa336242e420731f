//! Contract address derivation

use rlp::RlpStream;
use tessera_primitives::{Address, H256};

use crate::keccak256;

/// Address of a contract created by `sender` at `nonce`:
/// `keccak256(rlp([sender, nonce]))[12..]`.
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    last_20(&keccak256(&stream.out()))
}

/// Address of a salted creation:
/// `keccak256(0xff ++ sender ++ salt ++ init_code_hash)[12..]`.
pub fn create2_address(sender: &Address, salt: &H256, init_code_hash: &H256) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(sender.as_bytes());
    preimage[21..53].copy_from_slice(salt.as_bytes());
    preimage[53..].copy_from_slice(init_code_hash.as_bytes());
    last_20(&keccak256(&preimage))
}

fn last_20(hash: &H256) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from_hex(s).unwrap()
    }

    #[test]
    fn test_create_address_known_vectors() {
        let sender = addr("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        assert_eq!(
            create_address(&sender, 0),
            addr("0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d")
        );
        assert_eq!(
            create_address(&sender, 1),
            addr("0x343c43a37d37dff08ae8c4a11544c718abb4fcf8")
        );
    }

    #[test]
    fn test_create_address_depends_on_nonce() {
        let sender = Address::from_bytes([0x42; 20]);
        assert_ne!(create_address(&sender, 0), create_address(&sender, 1));
        assert_eq!(create_address(&sender, 7), create_address(&sender, 7));
    }

    #[test]
    fn test_create2_address_zero_salt() {
        // init code 0x00, zero sender, zero salt
        let init_hash = keccak256(&[0x00]);
        assert_eq!(
            create2_address(&Address::ZERO, &H256::ZERO, &init_hash),
            addr("0x4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38")
        );
    }

    #[test]
    fn test_create2_address_depends_on_salt() {
        let sender = Address::from_bytes([0x11; 20]);
        let init_hash = keccak256(&hex::decode("6000").unwrap());
        let a = create2_address(&sender, &H256::ZERO, &init_hash);
        let b = create2_address(&sender, &H256::from_bytes([1; 32]), &init_hash);
        assert_ne!(a, b);
    }
}
