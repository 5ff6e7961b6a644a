//! Travel card command dispatcher
//!
//! Owns the chaining state machine: chained frames are reassembled into one
//! command body, the body is routed by instruction, and the result is sent
//! back in frames of at most [`APDU_MAX_LENGTH`] bytes with 61xx telling the
//! host to continue with GET RESPONSE. Errors raised by any handler are
//! turned into a status word here and nowhere else.

use log::{debug, info, warn};
use zeroize::Zeroize;

use super::data_objects::{application_related_data, DataObjectRouter};
use super::session::{Session, APDU_MAX_LENGTH};
use crate::apdu::{ins, parse_apdu, Response, SW, APDU};
use crate::card::{CardDataStore, CardState, KeySlot};
use crate::config::CardConfig;
use crate::crypto::{CryptoBackend, CurveRegistry, SoftwareBackend};
use crate::error::CardError;
use crate::tlv::{hexify, tags, TLVEncoder};

/// GENERATE ASYMMETRIC KEY PAIR: generate a new key
const P1_GENERATE: u8 = 0x80;
/// GENERATE ASYMMETRIC KEY PAIR: read the existing public key
const P1_READ_PUBLIC_KEY: u8 = 0x81;

/// SELECT by DF name
const P1_SELECT_BY_NAME: u8 = 0x04;

/// Travel card applet
pub struct TravelCardApplet<B: CryptoBackend = SoftwareBackend> {
    config: CardConfig,
    store: CardDataStore,
    session: Session,
    registry: CurveRegistry,
    backend: B,
}

impl TravelCardApplet<SoftwareBackend> {
    /// Create an applet using the software crypto backend
    pub fn new(config: CardConfig) -> Self {
        Self::with_backend(config, SoftwareBackend)
    }
}

impl<B: CryptoBackend> TravelCardApplet<B> {
    /// Create an applet, loading any persisted state
    pub fn with_backend(config: CardConfig, backend: B) -> Self {
        let mut store = match &config.storage_dir {
            Some(dir) => CardDataStore::new(dir.clone()),
            None => CardDataStore::volatile(),
        };
        store.load();

        Self {
            config,
            store,
            session: Session::new(),
            registry: CurveRegistry::default(),
            backend,
        }
    }

    /// Process one raw command frame, returning data followed by SW1 SW2
    pub fn process_apdu(&mut self, raw: &[u8]) -> Vec<u8> {
        let response = match parse_apdu(raw) {
            Ok(cmd) => self.process(&cmd),
            Err(e) => {
                debug!("Malformed APDU {}: {}", hexify(raw), e);
                Response::error(SW::WRONG_LENGTH)
            }
        };
        response.to_bytes()
    }

    /// Process one command frame
    pub fn process(&mut self, cmd: &APDU) -> Response {
        debug!(
            "APDU: CLA={:02X} INS={:02X} P1={:02X} P2={:02X} Lc={} Le={:?}",
            cmd.cla,
            cmd.ins,
            cmd.p1,
            cmd.p2,
            cmd.data.len(),
            cmd.le
        );

        let result = if cmd.ins == ins::SELECT && !cmd.is_chained() {
            self.handle_select(cmd)
        } else if self.store.state().terminated {
            // Card-management extension: a terminated card only answers SELECT
            self.session.clear();
            Err(CardError::ConditionsNotSatisfied)
        } else if cmd.is_chained() {
            self.receive_chained(cmd).map(|()| Response::ok())
        } else if cmd.ins == ins::GET_RESPONSE {
            self.handle_get_response(cmd)
        } else {
            self.execute(cmd)
        };

        let response = result.unwrap_or_else(|e| Self::error_response(cmd, e));
        debug!("Response: SW={:04X} ({} bytes)", response.sw(), response.data.len());
        response
    }

    fn error_response(cmd: &APDU, error: CardError) -> Response {
        match error {
            CardError::MemoryFailure(_) | CardError::Crypto(_) => {
                warn!("INS={:02X} failed: {}", cmd.ins, error)
            }
            _ => debug!("INS={:02X} rejected: {}", cmd.ins, error),
        }
        Response::error(error.status_word())
    }

    /// SELECT: start a new session and answer with the application data
    fn handle_select(&mut self, cmd: &APDU) -> Result<Response, CardError> {
        let matches_aid = cmd.p1 == P1_SELECT_BY_NAME
            && !cmd.data.is_empty()
            && self.config.aid.starts_with(&cmd.data);
        if !matches_aid {
            return Err(CardError::FileNotFound);
        }

        self.session.clear();
        let application_data = application_related_data(&self.config.aid, self.store.state());
        info!("Travel card applet selected");
        Ok(Response::success(TLVEncoder::encode(
            tags::SELECT_RESPONSE as u32,
            &application_data,
        )))
    }

    /// Intermediate frame of a chained command
    fn receive_chained(&mut self, cmd: &APDU) -> Result<(), CardError> {
        self.session.prepare_chaining_input(cmd)?;
        self.session.receive_data(&cmd.data)
    }

    /// GET RESPONSE: next segment of a pending response
    fn handle_get_response(&mut self, cmd: &APDU) -> Result<Response, CardError> {
        if self.session.is_chaining_input() {
            self.session.abort_input();
            return Err(CardError::ChainingError);
        }
        if !self.session.is_chaining_output() {
            return Err(CardError::ChainingError);
        }
        if cmd.p1 != 0 || cmd.p2 != 0 {
            return Err(CardError::WrongP1P2);
        }
        Ok(self.session.next_segment(cmd.le))
    }

    /// Final (or only) frame of a command: reassemble, route, segment
    fn execute(&mut self, cmd: &APDU) -> Result<Response, CardError> {
        self.session.prepare_chaining_input(cmd)?;
        self.session.receive_data(&cmd.data)?;

        let mut body = self.session.take_input();
        let result = self.route(cmd, &body);
        body.zeroize();

        self.session.load_output(result?)?;
        Ok(self.session.next_segment(cmd.le))
    }

    fn route(&mut self, cmd: &APDU, body: &[u8]) -> Result<Vec<u8>, CardError> {
        let tag = cmd.p1p2();

        match cmd.ins {
            ins::GET_DATA => {
                DataObjectRouter::new(&mut self.session.cursor, &self.config.aid, &self.registry)
                    .get(tag, self.store.state())
            }
            ins::GET_NEXT_DATA => {
                DataObjectRouter::new(&mut self.session.cursor, &self.config.aid, &self.registry)
                    .get_next(tag, self.store.state())
            }
            ins::PUT_DATA | ins::PUT_DATA_ODD => {
                DataObjectRouter::new(&mut self.session.cursor, &self.config.aid, &self.registry)
                    .put(tag, body, &mut self.store)?;
                Ok(Vec::new())
            }
            ins::GENERATE_ASYMMETRIC_KEY_PAIR => {
                self.handle_generate_key(cmd.p1, cmd.p2, body)
            }
            ins::INTERNAL_AUTHENTICATE => self.handle_internal_authenticate(cmd.p1, cmd.p2, body),
            other => Err(CardError::InsNotSupported(other)),
        }
    }

    /// GENERATE ASYMMETRIC KEY PAIR
    fn handle_generate_key(&mut self, p1: u8, p2: u8, body: &[u8]) -> Result<Vec<u8>, CardError> {
        if !matches!(p1, P1_GENERATE | P1_READ_PUBLIC_KEY) || p2 != 0 {
            return Err(CardError::WrongP1P2);
        }
        if body.len() != 2 {
            return Err(CardError::WrongLength);
        }

        let crt = u16::from_be_bytes([body[0], body[1]]);
        let slot = KeySlot::from_crt(crt).ok_or(CardError::WrongData)?;

        if p1 == P1_GENERATE {
            let backend = &self.backend;
            let registry = &self.registry;
            self.store
                .atomic(|state| state.key_mut(slot).generate(backend, registry))?;
        }

        self.store.state().key(slot).export_public_key()
    }

    /// INTERNAL AUTHENTICATE: count, then sign the digest with the AUT key
    fn handle_internal_authenticate(
        &mut self,
        p1: u8,
        p2: u8,
        body: &[u8],
    ) -> Result<Vec<u8>, CardError> {
        self.store.atomic(|state| {
            state.increment_signature_counter();
            Ok(())
        })?;

        if p1 != 0 || p2 != 0 {
            return Err(CardError::WrongP1P2);
        }

        self.store
            .state()
            .key(KeySlot::Authentication)
            .sign(&self.backend, &self.registry, body)
    }

    /// Card management: terminate the card
    ///
    /// Not a wire command. Afterwards every command except SELECT gets 6985
    /// until [`Self::factory_reset`].
    pub fn terminate(&mut self) -> Result<(), CardError> {
        self.store.atomic(|state| {
            state.terminated = true;
            Ok(())
        })?;
        self.session.clear();
        info!("Card terminated");
        Ok(())
    }

    /// Card management: restore factory defaults
    pub fn factory_reset(&mut self) -> Result<(), CardError> {
        self.store.factory_reset()?;
        self.session.clear();
        Ok(())
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Get a reference to the current card state
    pub fn state(&self) -> &CardState {
        self.store.state()
    }

    pub fn store_mut(&mut self) -> &mut CardDataStore {
        &mut self.store
    }

    /// Largest response payload per frame
    pub const fn max_frame_payload() -> usize {
        APDU_MAX_LENGTH
    }
}
