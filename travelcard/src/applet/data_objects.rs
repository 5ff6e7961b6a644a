//! Tag object router
//!
//! Maps the P1-P2 tag of GET DATA, GET NEXT DATA and PUT DATA to the card
//! data it reads or writes, keeping the occurrence cursor in step.

use log::debug;

use super::session::{TagCursor, APDU_MAX_LENGTH};
use crate::card::{CardDataStore, CardState, KeySlot};
use crate::crypto::CurveRegistry;
use crate::error::CardError;
use crate::tlv::{tags, TLVBuilder};

/// Life cycle status byte: no information given
const LCS_BYTE: u8 = 0x00;

/// Routes data object access for one command
pub struct DataObjectRouter<'a> {
    cursor: &'a mut TagCursor,
    aid: &'a [u8],
    registry: &'a CurveRegistry,
}

impl<'a> DataObjectRouter<'a> {
    pub fn new(cursor: &'a mut TagCursor, aid: &'a [u8], registry: &'a CurveRegistry) -> Self {
        Self {
            cursor,
            aid,
            registry,
        }
    }

    fn current_slot(&self) -> Result<KeySlot, CardError> {
        KeySlot::from_occurrence(self.cursor.occurrence()).ok_or(CardError::ReferenceDataNotFound)
    }

    /// GET DATA
    pub fn get(&mut self, tag: u16, state: &CardState) -> Result<Vec<u8>, CardError> {
        self.cursor.select(tag);
        debug!("GET DATA {:04X} occurrence {}", tag, self.cursor.occurrence());

        match tag {
            tags::APPLICATION_RELATED_DATA => Ok(application_related_data(self.aid, state)),
            tags::CARDHOLDER_CERTIFICATE => {
                let slot = self.current_slot()?;
                Ok(state.key(slot).certificate().to_vec())
            }
            tags::ALGORITHM_ATTRIBUTES_AUT => {
                let slot = self.current_slot()?;
                Ok(state.key(slot).attributes().to_vec())
            }
            _ => Err(CardError::ReferenceDataNotFound),
        }
    }

    /// GET NEXT DATA: read the current occurrence, then step past it
    pub fn get_next(&mut self, tag: u16, state: &CardState) -> Result<Vec<u8>, CardError> {
        if tag != tags::CARDHOLDER_CERTIFICATE {
            return Err(CardError::WrongP1P2);
        }

        let slot = self.current_slot()?;
        debug!("GET NEXT DATA {:04X} occurrence {}", tag, self.cursor.occurrence());
        self.cursor.advance();
        Ok(state.key(slot).certificate().to_vec())
    }

    /// PUT DATA, committed atomically
    pub fn put(&mut self, tag: u16, body: &[u8], store: &mut CardDataStore) -> Result<(), CardError> {
        self.cursor.select(tag);
        debug!("PUT DATA {:04X} ({} bytes)", tag, body.len());

        match tag {
            tags::CARDHOLDER_CERTIFICATE => {
                let slot = self.current_slot()?;
                store.atomic(|state| state.key_mut(slot).set_certificate(body))
            }
            tags::ALGORITHM_ATTRIBUTES_AUT => {
                let slot = self.current_slot()?;
                let registry = self.registry;
                store.atomic(|state| state.key_mut(slot).set_attributes(body, registry))
            }
            _ => Err(CardError::ReferenceDataNotFound),
        }
    }
}

/// Application related data (6E)
pub fn application_related_data(aid: &[u8], state: &CardState) -> Vec<u8> {
    let max = (APDU_MAX_LENGTH as u16).to_be_bytes();
    let mut extended_length = Vec::with_capacity(8);
    for _ in 0..2 {
        extended_length.extend_from_slice(&[0x02, 0x02]);
        extended_length.extend_from_slice(&max);
    }

    let security_support = TLVBuilder::new()
        .add(tags::DIGITAL_SIG_COUNTER as u32, &state.signature_counter_bytes())
        .wrap(tags::SECURITY_SUPPORT_TEMPLATE as u32)
        .build();

    TLVBuilder::new()
        .add(tags::AID as u32, aid)
        .add(tags::LIFE_CYCLE_STATUS as u32, &[LCS_BYTE])
        .add_raw(&security_support)
        .add(tags::EXTENDED_LENGTH_INFORMATION as u32, &extended_length)
        .wrap(tags::APPLICATION_RELATED_DATA as u32)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AID: [u8; 4] = [0xF0, 0x01, 0x02, 0x03];

    #[test]
    fn test_application_related_data_layout() {
        let mut state = CardState::default();
        state.signature_counter = 0x010203;

        let data = application_related_data(&AID, &state);
        let expected = hex::decode(concat!(
            "6E1B",
            "4F04F0010203",
            "8A0100",
            "7A059303010203",
            "7F66080202010002020100"
        ))
        .unwrap();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_get_unknown_tag() {
        let mut cursor = TagCursor::default();
        let registry = CurveRegistry::default();
        let mut router = DataObjectRouter::new(&mut cursor, &AID, &registry);
        assert!(matches!(
            router.get(0x5F50, &CardState::default()),
            Err(CardError::ReferenceDataNotFound)
        ));
        assert_eq!(cursor.tag(), 0x5F50);
    }

    #[test]
    fn test_get_next_advances() {
        let mut state = CardState::default();
        state
            .key_mut(KeySlot::Authentication)
            .set_certificate(&[0x30, 0x01, 0x00])
            .unwrap();

        let mut cursor = TagCursor::default();
        let registry = CurveRegistry::default();
        let mut router = DataObjectRouter::new(&mut cursor, &AID, &registry);

        assert_eq!(router.get(0x7F21, &state).unwrap(), vec![0x30, 0x01, 0x00]);
        assert_eq!(router.get_next(0x7F21, &state).unwrap(), vec![0x30, 0x01, 0x00]);
        assert!(matches!(
            router.get_next(0x7F21, &state),
            Err(CardError::ReferenceDataNotFound)
        ));
        assert!(matches!(
            router.get_next(0x006E, &state),
            Err(CardError::WrongP1P2)
        ));

        // same tag keeps the cursor, a different tag resets it
        assert!(matches!(
            router.get(0x7F21, &state),
            Err(CardError::ReferenceDataNotFound)
        ));
        router.get(0x006E, &state).unwrap();
        assert_eq!(router.get(0x7F21, &state).unwrap(), vec![0x30, 0x01, 0x00]);
    }

    #[test]
    fn test_put_certificate_and_attributes() {
        let mut store = CardDataStore::volatile();
        let mut cursor = TagCursor::default();
        let registry = CurveRegistry::default();
        let mut router = DataObjectRouter::new(&mut cursor, &AID, &registry);

        router.put(0x7F21, b"certificate", &mut store).unwrap();
        assert_eq!(
            store.state().key(KeySlot::Authentication).certificate(),
            b"certificate"
        );

        let ec = [0x13, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
        router.put(tags::ALGORITHM_ATTRIBUTES_AUT, &ec, &mut store).unwrap();
        let key = store.state().key(KeySlot::Authentication);
        assert_eq!(key.attributes(), &ec);
        assert!(key.certificate().is_empty());
        assert_eq!(router.get(tags::ALGORITHM_ATTRIBUTES_AUT, store.state()).unwrap(), ec.to_vec());

        assert!(matches!(
            router.put(0x0065, &[0x00], &mut store),
            Err(CardError::ReferenceDataNotFound)
        ));
    }
}
