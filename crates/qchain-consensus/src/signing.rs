use qchain_core::block::BlockHeader;
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::types::{Address, QrSignature};
use qchain_crypto::KeyPair;

use crate::validator::ValidatorSet;

/// Sign a template header: compute `signing_hash` with `validator_sig`
/// zeroed, sign it, and fill in `validator_sig`. The caller is
/// responsible for having already set `header.validator_addr` to the
/// keypair's own address.
pub fn sign_header(keypair: &KeyPair, mut header: BlockHeader) -> qchain_crypto::Result<BlockHeader> {
    let digest = header.signing_hash();
    let signature = keypair.sign(digest.as_bytes())?;
    header.validator_sig = QrSignature::new(keypair.algorithm, keypair.public_key.clone(), signature);
    Ok(header)
}

/// Step 2 of the append protocol: header signature verifies, signer is
/// in the active set, and signer is the scheduled proposer for
/// `header.number`.
pub fn check_block_consensus(
    header: &BlockHeader,
    validators: &ValidatorSet,
    current_block: u64,
) -> ChainResult<()> {
    let digest = header.signing_hash();
    if !qchain_crypto::verify(digest.as_bytes(), &header.validator_sig) {
        return Err(ChainError::ConsensusViolation(
            "validator signature does not verify".into(),
        ));
    }

    let signer: Address = qchain_crypto::address_of(&header.validator_sig.public_key);
    if signer != header.validator_addr {
        return Err(ChainError::SenderMismatch);
    }

    let validator = validators
        .get(&header.validator_addr)
        .ok_or_else(|| ChainError::UnknownValidator(header.validator_addr.to_hex()))?;
    if !validator.is_active(current_block) {
        return Err(ChainError::ValidatorJailed(header.validator_addr.to_hex()));
    }

    let expected_proposer = validators.proposer_for(header.number);
    if expected_proposer != header.validator_addr {
        return Err(ChainError::ConsensusViolation(format!(
            "block {} signed by {}, expected proposer {}",
            header.number, header.validator_addr, expected_proposer
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;
    use qchain_core::block::Block;
    use qchain_core::types::{Hash, SigAlg};
    use crate::validator::ValidatorInfo;

    fn single_validator_set(keypair: &KeyPair) -> ValidatorSet {
        let info = ValidatorInfo {
            address: keypair.address(),
            public_key: keypair.public_key.clone(),
            sig_alg: keypair.algorithm,
            stake: U256::from(1_000u64),
            last_active: 0,
            jailed: false,
            jail_until: None,
            commission_bps: 0,
        };
        ValidatorSet::new(vec![info]).unwrap()
    }

    #[test]
    fn signed_header_passes_consensus_check_for_its_own_proposer_slot() {
        let keypair = qchain_crypto::keygen(SigAlg::Dilithium);
        let validators = single_validator_set(&keypair);
        let number = 0u64;
        let template = Block::unsigned_header(
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            keypair.address(),
            keypair.address(),
            number,
            10_000_000,
            0,
            1,
            vec![],
            keypair.algorithm,
        );
        let header = sign_header(&keypair, template).unwrap();
        check_block_consensus(&header, &validators, number).unwrap();
    }

    #[test]
    fn wrong_proposer_is_rejected() {
        let proposer = qchain_crypto::keygen(SigAlg::Dilithium);
        let impostor = qchain_crypto::keygen(SigAlg::Dilithium);
        let mut infos = vec![
            ValidatorInfo {
                address: proposer.address(),
                public_key: proposer.public_key.clone(),
                sig_alg: proposer.algorithm,
                stake: U256::from(1_000u64),
                last_active: 0,
                jailed: false,
                jail_until: None,
                commission_bps: 0,
            },
            ValidatorInfo {
                address: impostor.address(),
                public_key: impostor.public_key.clone(),
                sig_alg: impostor.algorithm,
                stake: U256::from(1_000u64),
                last_active: 0,
                jailed: false,
                jail_until: None,
                commission_bps: 0,
            },
        ];
        infos.sort_by_key(|v| v.address);
        let validators = ValidatorSet::new(infos).unwrap();

        // Find a slot where `impostor` signs but is not the scheduled proposer.
        let mut number = 0u64;
        while validators.proposer_for(number) == impostor.address() {
            number += 1;
        }
        let template = Block::unsigned_header(
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            impostor.address(),
            impostor.address(),
            number,
            10_000_000,
            0,
            1,
            vec![],
            impostor.algorithm,
        );
        let header = sign_header(&impostor, template).unwrap();
        let err = check_block_consensus(&header, &validators, number).unwrap_err();
        assert!(matches!(err, ChainError::ConsensusViolation(_)));
    }

    #[test]
    fn jailed_validator_is_rejected_even_if_scheduled() {
        let keypair = qchain_crypto::keygen(SigAlg::Dilithium);
        let mut validators = single_validator_set(&keypair);
        validators
            .get_mut(&keypair.address())
            .unwrap()
            .jailed = true;
        let template = Block::unsigned_header(
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            keypair.address(),
            keypair.address(),
            0,
            10_000_000,
            0,
            1,
            vec![],
            keypair.algorithm,
        );
        let header = sign_header(&keypair, template).unwrap();
        let err = check_block_consensus(&header, &validators, 0).unwrap_err();
        assert!(matches!(err, ChainError::ValidatorJailed(_)));
    }
}
