//! End-to-end tests: owners sign off-chain, a relayer submits, the gate executes.

use metatx_account::implementations::local::LocalAccount;
use metatx_account::AccountService;
use metatx_core::signature::SECP256K1_ORDER;
use metatx_core::{Caller, DispatchFailure, GateError, GateSettings, MetaGate};
use metatx_ledger::implementations::memory::MemoryLedger;
use metatx_ledger::{LedgerError, LedgerService};
use metatx_types::{
	Address, GateEvent, Operation, OperationKind, PayloadError, Selector, SignatureEnvelope,
	TransactionDescription, B256, ETH_SIGNED_MESSAGE_PREFIX, U256,
};
use tokio::sync::broadcast::error::TryRecvError;

const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const BOB_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const CAROL_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

fn gate_address() -> Address {
	Address::repeat_byte(0x42)
}

fn account(key: &str) -> AccountService {
	AccountService::new(Box::new(LocalAccount::from_private_key(key).unwrap()))
}

struct Harness {
	gate: MetaGate,
	alice: AccountService,
	bob: AccountService,
	carol: AccountService,
}

impl Harness {
	fn new() -> Self {
		Self::with_settings(GateSettings::new(gate_address()))
	}

	fn with_settings(settings: GateSettings) -> Self {
		init_tracing();
		let alice = account(ALICE_KEY);
		let ledger = MemoryLedger::with_balances([(alice.get_address(), U256::from(1_000))]);
		Self {
			gate: MetaGate::new(settings, LedgerService::new(Box::new(ledger))),
			alice,
			bob: account(BOB_KEY),
			carol: account(CAROL_KEY),
		}
	}

	fn transfer_tx(&self, to: Address, amount: u64, nonce: u64) -> TransactionDescription {
		let operation = Operation::TransferOnBehalf {
			owner: self.alice.get_address(),
			to,
			amount: U256::from(amount),
		};
		TransactionDescription::new(operation.encode()).with_nonce(U256::from(nonce))
	}

	fn approval_tx(&self, operator: Address, approved: bool, nonce: u64) -> TransactionDescription {
		let operation = Operation::SetOperatorApproval {
			owner: self.alice.get_address(),
			operator,
			approved,
		};
		TransactionDescription::new(operation.encode()).with_nonce(U256::from(nonce))
	}

	fn sign(&self, signer: &AccountService, tx: &TransactionDescription) -> SignatureEnvelope {
		signer.sign_transaction(self.gate.codec(), tx, None).unwrap()
	}

	fn balances(&self) -> (U256, U256) {
		(
			self.gate.balance_of(&self.alice.get_address()),
			self.gate.balance_of(&self.bob.get_address()),
		)
	}
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<GateEvent>) -> Vec<GateEvent> {
	let mut events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		events.push(event);
	}
	events
}

#[test]
fn test_relayed_transfer_moves_balance_and_emits_event() {
	let mut h = Harness::new();
	let mut events = h.gate.subscribe();
	let (alice, bob) = (h.alice.get_address(), h.bob.get_address());

	let tx = h.transfer_tx(bob, 100, 1);
	let sig = h.sign(&h.alice, &tx);
	let receipt = h.gate.execute(&tx, &sig).unwrap();

	assert_eq!(receipt.owner, alice);
	assert_eq!(receipt.operation, OperationKind::TransferOnBehalf);
	assert_eq!(receipt.tx_hash, h.gate.hash_transaction(&tx));
	assert!(receipt.steps_used > 0);
	assert_eq!(h.balances(), (U256::from(900), U256::from(100)));

	assert_eq!(
		drain(&mut events),
		vec![
			GateEvent::Transfer {
				from: alice,
				to: bob,
				amount: U256::from(100)
			},
			GateEvent::MetaTransactionExecuted {
				owner: alice,
				operation: OperationKind::TransferOnBehalf,
				nonce: U256::from(1),
				tx_hash: receipt.tx_hash
			},
		]
	);
}

#[test]
fn test_relayed_approval_grant_and_revoke() {
	let mut h = Harness::new();
	let mut events = h.gate.subscribe();
	let (alice, carol) = (h.alice.get_address(), h.carol.get_address());

	let grant = h.approval_tx(carol, true, 1);
	let sig = h.sign(&h.alice, &grant);
	h.gate.execute(&grant, &sig).unwrap();

	assert!(h.gate.is_approved(alice, carol));
	assert_eq!(
		drain(&mut events).first(),
		Some(&GateEvent::ApprovalChanged {
			owner: alice,
			operator: carol,
			approved: true
		})
	);

	let revoke = h.approval_tx(carol, false, 2);
	let sig = h.sign(&h.alice, &revoke);
	h.gate.execute(&revoke, &sig).unwrap();

	assert!(!h.gate.is_approved(alice, carol));
	assert_eq!(
		drain(&mut events).first(),
		Some(&GateEvent::ApprovalChanged {
			owner: alice,
			operator: carol,
			approved: false
		})
	);
}

#[test]
fn test_relayed_result_matches_direct_call() {
	let mut relayed = Harness::new();
	let mut direct = Harness::new();
	let (alice, bob) = (relayed.alice.get_address(), relayed.bob.get_address());

	let tx = relayed.transfer_tx(bob, 250, 7);
	let sig = relayed.sign(&relayed.alice, &tx);
	relayed.gate.execute(&tx, &sig).unwrap();
	direct
		.gate
		.transfer_on_behalf(alice, alice, bob, U256::from(250))
		.unwrap();

	assert_eq!(relayed.balances(), direct.balances());
}

#[test]
fn test_wrong_signer_rejected_without_effects() {
	let mut h = Harness::new();
	let mut events = h.gate.subscribe();
	let before = h.balances();

	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.bob, &tx);

	assert_eq!(h.gate.execute(&tx, &sig), Err(GateError::InvalidSignature));
	assert_eq!(h.balances(), before);
	assert!(!h.gate.is_nonce_used(h.alice.get_address(), U256::from(1)));
	assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn test_signature_binds_every_field_and_gate() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.alice, &tx);

	let tampered = [
		tx.clone().with_nonce(U256::from(2)),
		tx.clone().with_value(U256::from(1)),
		tx.clone().with_fee(U256::from(1), None),
		tx.clone().with_extra_data(vec![0x01]),
	];
	for variant in &tampered {
		assert_eq!(h.gate.execute(variant, &sig), Err(GateError::InvalidSignature));
	}

	let other_gate = metatx_types::TransactionCodec::new(Address::repeat_byte(0x43));
	let foreign = h.alice.sign_transaction(&other_gate, &tx, None).unwrap();
	assert_eq!(h.gate.execute(&tx, &foreign), Err(GateError::InvalidSignature));

	assert_eq!(h.balances(), (U256::from(1_000), U256::ZERO));
}

#[test]
fn test_prefix_convention_is_honoured() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 10, 1);

	let prefixed = h
		.alice
		.sign_transaction(h.gate.codec(), &tx, Some(ETH_SIGNED_MESSAGE_PREFIX))
		.unwrap();

	let mut stripped = prefixed.clone();
	stripped.sig_prefix.clear();
	assert_eq!(h.gate.execute(&tx, &stripped), Err(GateError::InvalidSignature));

	let raw = h.sign(&h.alice, &tx);
	let mislabeled = raw.with_prefix(ETH_SIGNED_MESSAGE_PREFIX);
	assert_eq!(h.gate.execute(&tx, &mislabeled), Err(GateError::InvalidSignature));

	h.gate.execute(&tx, &prefixed).unwrap();
	assert_eq!(h.balances(), (U256::from(990), U256::from(10)));
}

#[test]
fn test_raw_recovery_ids_accepted() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 10, 1);
	let legacy = h.sign(&h.alice, &tx);
	let raw = SignatureEnvelope::new(legacy.recovery_id - 27, legacy.r, legacy.s);

	let hash = h.gate.hash_transaction(&tx);
	assert_eq!(
		h.gate.recover_signer(&hash, &raw).unwrap(),
		h.gate.recover_signer(&hash, &legacy).unwrap()
	);

	h.gate.execute(&tx, &raw).unwrap();
	assert_eq!(h.balances(), (U256::from(990), U256::from(10)));
}

#[test]
fn test_high_s_signature_accepted() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 10, 1);
	let low = h.sign(&h.alice, &tx);

	let high_s = SECP256K1_ORDER - U256::from_be_bytes(low.s.0);
	let twin = SignatureEnvelope::new(
		55 - low.recovery_id,
		low.r,
		B256::from(high_s.to_be_bytes::<32>()),
	);

	h.gate.execute(&tx, &twin).unwrap();
	assert_eq!(h.balances(), (U256::from(990), U256::from(10)));
}

#[test]
fn test_zero_event_capacity_still_delivers() {
	let settings = GateSettings::new(gate_address()).with_event_capacity(0);
	let mut h = Harness::with_settings(settings);
	let mut events = h.gate.subscribe();
	let (alice, carol) = (h.alice.get_address(), h.carol.get_address());

	h.gate.set_approval(alice, alice, carol, true).unwrap();
	assert_eq!(
		events.try_recv(),
		Ok(GateEvent::ApprovalChanged {
			owner: alice,
			operator: carol,
			approved: true
		})
	);
}

#[test]
fn test_unrecoverable_signature_rejected() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 10, 1);
	let legacy = h.sign(&h.alice, &tx);

	let zeroed = SignatureEnvelope::new(27, Default::default(), Default::default());
	assert_eq!(h.gate.execute(&tx, &zeroed), Err(GateError::InvalidSignature));

	let bad_version = SignatureEnvelope::new(30, legacy.r, legacy.s);
	assert_eq!(h.gate.execute(&tx, &bad_version), Err(GateError::InvalidSignature));
}

#[test]
fn test_unknown_selector_not_allowed() {
	let mut h = Harness::new();
	let selector = Selector::from([0xde, 0xad, 0xbe, 0xef]);

	let mut payload = selector.to_vec();
	payload.extend_from_slice(&[0u8; 12]);
	payload.extend_from_slice(h.alice.get_address().as_slice());
	let tx = TransactionDescription::new(payload).with_nonce(U256::from(1));
	let sig = h.sign(&h.alice, &tx);

	assert_eq!(
		h.gate.execute(&tx, &sig),
		Err(GateError::OperationNotAllowed { selector })
	);
}

#[test]
fn test_disallowed_operation_fenced_despite_valid_signature() {
	let settings = GateSettings::new(gate_address())
		.with_allowed_operations(vec![OperationKind::SetOperatorApproval]);
	let mut h = Harness::with_settings(settings);

	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.alice, &tx);
	assert_eq!(
		h.gate.execute(&tx, &sig),
		Err(GateError::OperationNotAllowed {
			selector: OperationKind::TransferOnBehalf.selector()
		})
	);
	assert_eq!(h.balances(), (U256::from(1_000), U256::ZERO));

	let approval = h.approval_tx(h.carol.get_address(), true, 2);
	let sig = h.sign(&h.alice, &approval);
	h.gate.execute(&approval, &sig).unwrap();
}

#[test]
fn test_malformed_payloads() {
	let mut h = Harness::new();

	let short = TransactionDescription::new(vec![0x01, 0x02, 0x03]);
	let sig = h.sign(&h.alice, &short);
	assert_eq!(
		h.gate.execute(&short, &sig),
		Err(GateError::InvalidPayload(PayloadError::TooShort { length: 3 }))
	);

	let mut dirty = h.transfer_tx(h.bob.get_address(), 1, 1).payload.to_vec();
	dirty[4] = 0xff;
	let dirty = TransactionDescription::new(dirty);
	let sig = h.sign(&h.alice, &dirty);
	assert_eq!(
		h.gate.execute(&dirty, &sig),
		Err(GateError::InvalidPayload(PayloadError::DirtyOwnerWord))
	);

	let mut truncated = h.transfer_tx(h.bob.get_address(), 1, 1).payload.to_vec();
	truncated.truncate(68);
	let truncated = TransactionDescription::new(truncated);
	let sig = h.sign(&h.alice, &truncated);
	assert!(matches!(
		h.gate.execute(&truncated, &sig),
		Err(GateError::ExecutionFailed(DispatchFailure::Decode(_)))
	));
}

#[test]
fn test_zero_recipient_rejected() {
	let mut h = Harness::new();
	let alice = h.alice.get_address();

	let tx = h.transfer_tx(Address::ZERO, 100, 1);
	let sig = h.sign(&h.alice, &tx);
	let err = h.gate.execute(&tx, &sig).unwrap_err();
	assert!(matches!(err, GateError::ExecutionFailed(_)));
	assert_eq!(err.root_cause(), &GateError::InvalidRecipient);

	assert_eq!(
		h.gate
			.transfer_on_behalf(alice, alice, Address::ZERO, U256::from(100)),
		Err(GateError::InvalidRecipient)
	);
	assert_eq!(h.gate.balance_of(&alice), U256::from(1_000));
}

#[test]
fn test_insufficient_balance_surfaces_ledger_error() {
	let mut h = Harness::new();
	let tx = h.transfer_tx(h.bob.get_address(), 5_000, 1);
	let sig = h.sign(&h.alice, &tx);

	let err = h.gate.execute(&tx, &sig).unwrap_err();
	assert!(matches!(
		err.root_cause(),
		GateError::Ledger(LedgerError::InsufficientBalance { .. })
	));
	assert!(!h.gate.is_nonce_used(h.alice.get_address(), U256::from(1)));
}

#[test]
fn test_nonce_replay_rejected() {
	let mut h = Harness::new();
	let alice = h.alice.get_address();
	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.alice, &tx);

	h.gate.execute(&tx, &sig).unwrap();
	assert!(h.gate.is_nonce_used(alice, U256::from(1)));
	assert_eq!(
		h.gate.execute(&tx, &sig),
		Err(GateError::NonceAlreadyUsed {
			owner: alice,
			nonce: U256::from(1)
		})
	);
	assert_eq!(h.balances(), (U256::from(900), U256::from(100)));

	let next = h.transfer_tx(h.bob.get_address(), 100, 2);
	let sig = h.sign(&h.alice, &next);
	h.gate.execute(&next, &sig).unwrap();
	assert_eq!(h.balances(), (U256::from(800), U256::from(200)));
}

#[test]
fn test_replay_allowed_when_protection_disabled() {
	let settings = GateSettings::new(gate_address()).with_replay_protection(false);
	let mut h = Harness::with_settings(settings);
	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.alice, &tx);

	h.gate.execute(&tx, &sig).unwrap();
	h.gate.execute(&tx, &sig).unwrap();

	assert_eq!(h.balances(), (U256::from(800), U256::from(200)));
	assert!(!h.gate.is_nonce_used(h.alice.get_address(), U256::from(1)));
}

#[test]
fn test_step_ceiling_bounds_dispatch() {
	let mut h = Harness::with_settings(GateSettings::new(gate_address()).with_step_limit(10_000));
	let mut events = h.gate.subscribe();

	let tx = h.transfer_tx(h.bob.get_address(), 100, 1);
	let sig = h.sign(&h.alice, &tx);
	assert!(matches!(
		h.gate.execute(&tx, &sig),
		Err(GateError::ExecutionFailed(DispatchFailure::OutOfSteps {
			limit: 10_000,
			..
		}))
	));
	assert_eq!(h.balances(), (U256::from(1_000), U256::ZERO));
	assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

	let approval = h.approval_tx(h.carol.get_address(), true, 1);
	let sig = h.sign(&h.alice, &approval);
	let receipt = h.gate.execute(&approval, &sig).unwrap();
	assert!(receipt.steps_used <= 10_000);
}

#[test]
fn test_direct_calls_and_operator_delegation() {
	let mut h = Harness::new();
	let (alice, bob, carol) = (
		h.alice.get_address(),
		h.bob.get_address(),
		h.carol.get_address(),
	);

	assert_eq!(
		h.gate.transfer_on_behalf(carol, alice, bob, U256::from(10)),
		Err(GateError::InvalidSender)
	);

	h.gate.set_approval(alice, alice, carol, true).unwrap();
	h.gate
		.transfer_on_behalf(carol, alice, bob, U256::from(10))
		.unwrap();
	assert_eq!(h.balances(), (U256::from(990), U256::from(10)));

	assert_eq!(
		h.gate.set_approval(carol, alice, bob, true),
		Err(GateError::InvalidSender)
	);
	assert!(!h.gate.is_approved(alice, bob));

	h.gate.set_approval(alice, alice, carol, false).unwrap();
	assert_eq!(
		h.gate.transfer_on_behalf(carol, alice, bob, U256::from(10)),
		Err(GateError::InvalidSender)
	);
}

#[test]
fn test_authorize_actor() {
	let mut h = Harness::new();
	let (alice, carol) = (h.alice.get_address(), h.carol.get_address());

	assert!(h.gate.authorize_actor(&Caller::Account(alice), alice));
	assert!(!h.gate.authorize_actor(&Caller::Account(carol), alice));

	h.gate.set_approval(alice, alice, carol, true).unwrap();
	assert!(h.gate.authorize_actor(&Caller::Account(carol), alice));

	h.gate.set_approval(alice, alice, carol, false).unwrap();
	assert!(!h.gate.authorize_actor(&Caller::Account(carol), alice));

	assert!(h.gate.authorize_actor(&Caller::Dispatch { owner: alice }, alice));
	assert!(!h.gate.authorize_actor(&Caller::Dispatch { owner: carol }, alice));
}

#[test]
fn test_gate_address_is_not_a_dispatch_identity() {
	let mut h = Harness::new();
	let (alice, bob) = (h.alice.get_address(), h.bob.get_address());

	assert_eq!(
		h.gate
			.transfer_on_behalf(gate_address(), alice, bob, U256::from(1)),
		Err(GateError::InvalidSender)
	);
	assert_eq!(
		h.gate.set_approval(gate_address(), alice, bob, true),
		Err(GateError::InvalidSender)
	);
}
