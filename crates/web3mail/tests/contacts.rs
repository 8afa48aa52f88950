//! Integration tests for contact discovery.

#![allow(clippy::unwrap_used)]

mod common;

use alloy_primitives::Address;

use common::{
    FakeIndexer, FakeMarketplace, FakeStorage, PROTECTED_DATA, WALLET, WHITELIST, client,
    dataset_order, record,
};
use web3mail::config::BELLECOUR_DAPP_ADDRESS;
use web3mail::marketplace::ANY_DATASET;
use web3mail::order::OrderKind;
use web3mail::validation::Rule;
use web3mail::{Error, SendEmailParams};

const SECOND: &str = "0x0000000000000000000000000000000000000b0b";
const APP_ADDRESS: &str = "0x0000000000000000000000000000000000000a99";

fn address(value: &str) -> Address {
    value.parse().unwrap()
}

#[tokio::test]
async fn test_contacts_query_both_apps_for_the_wallet() {
    let web3mail = client(
        FakeMarketplace::default(),
        FakeIndexer::default(),
        FakeStorage::default(),
    );

    let contacts = web3mail.fetch_my_contacts(true).await.unwrap();
    assert!(contacts.is_empty());

    let log = web3mail.marketplace().log();
    assert_eq!(log.dataset_queries.len(), 2);
    let wallet = format!("{WALLET:#x}");
    for (dataset, query) in &log.dataset_queries {
        assert_eq!(dataset, ANY_DATASET);
        assert_eq!(query.requester.as_deref(), Some(wallet.as_str()));
        assert!(query.is_app_strict);
        assert!(query.is_requester_strict);
        assert_eq!(query.page_size, Some(1000));
    }
    let apps: Vec<_> = log
        .dataset_queries
        .iter()
        .map(|(_, q)| q.app.clone().unwrap())
        .collect();
    assert!(apps.contains(&BELLECOUR_DAPP_ADDRESS.to_owned()));
    assert!(apps.contains(&WHITELIST.to_owned()));
}

#[tokio::test]
async fn test_contacts_are_deduplicated_across_apps() {
    let primary = dataset_order(address(PROTECTED_DATA), 0, Address::ZERO);
    let whitelisted = dataset_order(address(PROTECTED_DATA), 0, WALLET);
    let second = dataset_order(address(SECOND), 2, WALLET);
    let marketplace = FakeMarketplace::default()
        .with_dataset_orders(BELLECOUR_DAPP_ADDRESS, vec![primary])
        .with_dataset_orders(WHITELIST, vec![whitelisted, second]);
    let web3mail = client(
        marketplace,
        FakeIndexer::mailable(&[PROTECTED_DATA, SECOND]),
        FakeStorage::default(),
    );

    let contacts = web3mail.fetch_my_contacts(false).await.unwrap();

    let addresses: Vec<&str> = contacts.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(addresses, vec![PROTECTED_DATA, SECOND]);
    assert!(!contacts[0].is_user_strict);
    assert!(contacts[1].is_user_strict);
    assert_eq!(contacts[1].access_price, 2);
    assert_eq!(contacts[0].remaining_access, 10);
    assert_eq!(contacts[0].owner, format!("{:#x}", Address::repeat_byte(0xee)));
}

#[tokio::test]
async fn test_contacts_exclude_non_protected_data_and_missing_email() {
    let no_email = "0x0000000000000000000000000000000000000c0c";
    let marketplace = FakeMarketplace::default().with_dataset_orders(
        BELLECOUR_DAPP_ADDRESS,
        vec![
            dataset_order(address(PROTECTED_DATA), 0, Address::ZERO),
            dataset_order(address(APP_ADDRESS), 0, Address::ZERO),
            dataset_order(address(no_email), 0, Address::ZERO),
        ],
    );
    let indexer = FakeIndexer::mailable(&[PROTECTED_DATA])
        .with_record(record(no_email, &["file:application/octet-stream"]));
    let web3mail = client(marketplace, indexer.clone(), FakeStorage::default());

    let contacts = web3mail.fetch_my_contacts(false).await.unwrap();

    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].address, PROTECTED_DATA);
    let queries = indexer.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].len(), 3);
}

#[tokio::test]
async fn test_empty_books_skip_the_indexer() {
    let indexer = FakeIndexer::default();
    let web3mail = client(
        FakeMarketplace::default(),
        indexer.clone(),
        FakeStorage::default(),
    );

    web3mail.fetch_my_contacts(false).await.unwrap();

    assert!(indexer.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_order_book_fails_contact_listing() {
    let indexer = FakeIndexer::mailable(&[PROTECTED_DATA]);
    let marketplace = FakeMarketplace::default()
        .with_dataset_orders(
            BELLECOUR_DAPP_ADDRESS,
            vec![dataset_order(address(PROTECTED_DATA), 0, Address::ZERO)],
        )
        .with_unreachable_book(OrderKind::Dataset);
    let web3mail = client(marketplace, indexer.clone(), FakeStorage::default());

    let err = web3mail.fetch_my_contacts(false).await.unwrap_err();

    assert!(matches!(err, Error::Service { .. }));
    assert!(err.is_protocol_error());
    assert!(err.to_string().starts_with("Failed to fetch my contacts"));
    assert!(indexer.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_contacts_use_the_given_address() {
    let web3mail = client(
        FakeMarketplace::default(),
        FakeIndexer::default(),
        FakeStorage::default(),
    );

    web3mail
        .fetch_user_contacts("0x0000000000000000000000000000000000000D0D", false)
        .await
        .unwrap();

    let log = web3mail.marketplace().log();
    for (_, query) in &log.dataset_queries {
        assert_eq!(
            query.requester.as_deref(),
            Some("0x0000000000000000000000000000000000000d0d")
        );
        assert!(!query.is_requester_strict);
    }
}

#[tokio::test]
async fn test_user_contacts_reject_ens_names() {
    let web3mail = client(
        FakeMarketplace::default(),
        FakeIndexer::default(),
        FakeStorage::default(),
    );

    let err = web3mail
        .fetch_user_contacts("alice.eth", false)
        .await
        .unwrap_err();

    match err {
        Error::Validation(validation) => {
            assert_eq!(validation.field(), "userAddress");
            assert_eq!(validation.rule(), Rule::Address);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(web3mail.marketplace().log().book_queries(), 0);
}

#[tokio::test]
async fn test_listed_contact_can_be_emailed() {
    let web3mail = client(
        FakeMarketplace::with_free_orders(),
        FakeIndexer::mailable(&[PROTECTED_DATA]),
        FakeStorage::default(),
    );

    let contacts = web3mail.fetch_my_contacts(false).await.unwrap();
    assert_eq!(contacts.len(), 1);

    let params = SendEmailParams::builder()
        .protected_data(contacts[0].address.clone())
        .email_subject("Hello")
        .email_content("Nice to meet you.")
        .build()
        .unwrap();
    let task = web3mail.send_email(&params).await.unwrap();

    assert_eq!(task.index, 0);
    assert_eq!(web3mail.marketplace().log().matches.len(), 1);
}
