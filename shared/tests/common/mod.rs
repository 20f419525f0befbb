#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use shared::capabilities::{
    KeyValueOperation, KeyValueResponse, KeyValueResult, KeyValueValue, StoreOperation,
};
use shared::model::User;
use shared::{App, Effect, Event, Model};

pub type Tester = AppTester<App, Effect>;

pub fn user() -> User {
    User {
        uid: "uid-1".into(),
        email: Some("shopper@example.com".into()),
    }
}

/// Feeds every event an update produced back into the app and returns all
/// effects emitted along the way.
pub fn settle(app: &Tester, model: &mut Model, update: Update<Effect, Event>) -> Vec<Effect> {
    let mut effects = update.effects;
    for event in update.events {
        let next = app.update(event, model);
        effects.extend(settle(app, model, next));
    }
    effects
}

pub fn store_requests(effects: Vec<Effect>) -> Vec<Request<StoreOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Store(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn kv_ops(effects: &[Effect]) -> Vec<KeyValueOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::KeyValue(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub fn store_ops(effects: &[Effect]) -> Vec<StoreOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Store(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub fn subscription_to(
    requests: Vec<Request<StoreOperation>>,
    path: &str,
) -> Option<Request<StoreOperation>> {
    requests.into_iter().find(|r| {
        matches!(&r.operation, StoreOperation::Subscribe { path: p, .. } if p.as_str() == path)
    })
}

pub fn remember(list_id: &str) -> KeyValueOperation {
    KeyValueOperation::Set {
        key: "lastListId".into(),
        value: list_id.as_bytes().to_vec(),
    }
}

pub fn forget() -> KeyValueOperation {
    KeyValueOperation::Delete {
        key: "lastListId".into(),
    }
}

/// Signs in and answers the last-list preference read with `stored`. Returns
/// every other effect emitted along the way.
pub fn sign_in_with(app: &Tester, model: &mut Model, stored: Option<&str>) -> Vec<Effect> {
    let update = app.update(Event::AuthStateChanged(Some(user())), model);
    let mut effects = update.effects;

    let position = effects
        .iter()
        .position(|e| matches!(e, Effect::KeyValue(_)))
        .expect("preference read requested");
    let mut read = match effects.remove(position) {
        Effect::KeyValue(request) => request,
        _ => unreachable!(),
    };
    assert!(matches!(read.operation, KeyValueOperation::Get { .. }));

    let value = stored.map_or(KeyValueValue::None, |id| {
        KeyValueValue::Bytes(id.as_bytes().to_vec())
    });
    let resolved = app
        .resolve(
            &mut read,
            KeyValueResult::Ok {
                response: KeyValueResponse::Get { value },
            },
        )
        .expect("preference read resolves");
    effects.extend(settle(app, model, resolved));
    effects
}
