use tracing::{debug, info, warn};

use crate::bootstrap::BootstrapStep;
use crate::capabilities::{Capabilities, Prefs, PrefsKey};
use crate::confirm::{ConfirmOutcome, Resolution};
use crate::error::AppError;
use crate::event::Event;
use crate::gateway::MutationGateway;
use crate::model::{AuthState, ConfirmAction, ListMeta, Model, User};
use crate::paths::{CollectionId, PathLayout};
use crate::reconcile::RenderChange;
use crate::session::SessionKind;
use crate::store::{Snapshot, StoreAdapter};
use crate::view::{self, ViewModel, MAIN_LIST_NAME};

#[derive(Default)]
pub struct App;

impl App {
    fn prefs_key(model: &Model) -> Option<PrefsKey> {
        match PrefsKey::new(model.config.last_list_key.as_str()) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "last list preference key rejected");
                None
            }
        }
    }

    fn remember_selection(model: &Model, caps: &Capabilities, collection: &CollectionId) {
        let Some(key) = Self::prefs_key(model) else {
            return;
        };
        let prefs = Prefs::new(&caps.kv);
        match collection {
            CollectionId::Main => prefs.remove(&key, Event::PreferenceWritten),
            CollectionId::Custom(id) => {
                if let Err(e) = prefs.set(&key, id, Event::PreferenceWritten) {
                    warn!(%collection, error = %e, "failed to persist list selection");
                }
            }
        }
    }

    fn forget_selection(model: &Model, caps: &Capabilities) {
        if let Some(key) = Self::prefs_key(model) {
            Prefs::new(&caps.kv).remove(&key, Event::PreferenceWritten);
        }
    }

    /// Points the items session at `collection`. Selecting the list that is
    /// already showing does nothing.
    fn select_collection(model: &mut Model, caps: &Capabilities, collection: CollectionId, persist: bool) {
        model.bootstrap.cancel();

        if model.items.active_target() == Some(&collection) {
            debug!(%collection, "list already active");
            return;
        }

        let path = match model.layout.items(&collection) {
            Ok(path) => path,
            Err(e) => {
                warn!(%collection, error = %e, "cannot open list");
                return;
            }
        };

        info!(%collection, %path, "selecting list");
        model.items.open(collection.clone(), path, &caps.store);
        model.last_changes.clear();

        if persist {
            Self::remember_selection(model, caps, &collection);
        }
    }

    fn signed_in(model: &mut Model, caps: &Capabilities, user: User) {
        if let AuthState::SignedIn(current) = &model.auth {
            if current.uid == user.uid {
                model.auth = AuthState::SignedIn(user);
                return;
            }
            Self::signed_out(model, caps);
        }

        info!(uid = %user.uid, "signed in");
        model.auth = AuthState::SignedIn(user);
        model.alert = None;

        let root = model.layout.lists_root().clone();
        model.lists.open(root.clone(), root, &caps.store);

        let token = model.bootstrap.start();
        match Self::prefs_key(model) {
            Some(key) => Prefs::new(&caps.kv)
                .get(&key, move |response| Event::PreferenceLoaded { token, response }),
            None => {
                if let Some(step) = model.bootstrap.on_preference(token, None) {
                    Self::apply_bootstrap_step(model, caps, step);
                }
            }
        }
    }

    fn signed_out(model: &mut Model, caps: &Capabilities) {
        if model.auth.is_signed_in() {
            info!("signed out");
        }
        model.items.close(&caps.store);
        model.lists.close(&caps.store);
        model.bootstrap.cancel();
        if let Some(dropped) = model.confirm.cancel() {
            debug!(id = %dropped.id, "pending confirmation dropped on sign-out");
        }
        model.last_changes.clear();
        model.auth = AuthState::SignedOut;
    }

    fn apply_bootstrap_step(model: &mut Model, caps: &Capabilities, step: BootstrapStep) {
        match step {
            BootstrapStep::VerifyList { token, list_id } => match model.layout.list_meta(&list_id) {
                Ok(path) => {
                    debug!(%list_id, %path, "verifying remembered list");
                    caps.store.read_once(token, path);
                }
                Err(e) => {
                    warn!(%list_id, error = %e, "remembered list id is not a valid key");
                    if let Some(step) = model.bootstrap.on_meta_read(token, Ok(Snapshot::absent())) {
                        Self::apply_bootstrap_step(model, caps, step);
                    }
                }
            },
            BootstrapStep::Select {
                collection,
                clear_persisted,
            } => {
                if clear_persisted {
                    Self::forget_selection(model, caps);
                }
                Self::select_collection(model, caps, collection, false);
            }
        }
    }

    /// Falls back to Main when the showing list disappears from the lists
    /// collection, e.g. after it was deleted on another device.
    fn lists_changed(model: &mut Model, caps: &Capabilities, changes: &[RenderChange<ListMeta>]) {
        let Some(CollectionId::Custom(active)) = model.items.active_target().cloned() else {
            return;
        };
        let removed = changes
            .iter()
            .any(|c| matches!(c, RenderChange::Remove { id, .. } if *id == active));
        if removed {
            info!(list_id = %active, "active list removed remotely");
            Self::forget_selection(model, caps);
            Self::select_collection(model, caps, CollectionId::Main, false);
        }
    }

    /// Moves open sessions onto a new path layout.
    fn reopen_sessions(model: &mut Model, caps: &Capabilities, previous: &PathLayout) {
        if model.layout == *previous || !model.auth.is_signed_in() {
            return;
        }

        let root = model.layout.lists_root().clone();
        model.lists.open(root.clone(), root, &caps.store);

        if let Some(active) = model.items.active_target().cloned() {
            match model.layout.items(&active) {
                Ok(path) => {
                    model.items.open(active, path, &caps.store);
                }
                Err(e) => {
                    warn!(collection = %active, error = %e, "list unreachable under new layout");
                    model.items.close(&caps.store);
                    Self::select_collection(model, caps, CollectionId::Main, false);
                }
            }
            model.last_changes.clear();
        }
        caps.render.render();
    }

    fn delete_list(model: &mut Model, caps: &Capabilities, list_id: String) {
        let collection = CollectionId::Custom(list_id);
        let gateway = MutationGateway::new(&caps.store, &model.layout);
        if let Err(e) = gateway.delete_list(&collection) {
            warn!(%collection, error = %e, "delete list failed");
            return;
        }

        if model.items.active_target() == Some(&collection) {
            Self::forget_selection(model, caps);
            Self::select_collection(model, caps, CollectionId::Main, false);
        }
    }

    fn delete_prompt(model: &Model, list_id: &str) -> String {
        match model.list_name(&CollectionId::Custom(list_id.to_string())) {
            Some(name) => format!("Delete \"{name}\" and all its items?"),
            None => "Delete this list and all its items?".to_string(),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), user = event.is_user_initiated(), "update");

        match event {
            Event::AppStarted => {
                caps.auth.watch_state(Event::AuthStateChanged);
                caps.render.render();
            }

            Event::Configure(config) => {
                let layout = match config.validate().and_then(|()| config.layout()) {
                    Ok(layout) => layout,
                    Err(e) => {
                        warn!(error = %e, "configuration rejected");
                        return;
                    }
                };
                model.taps.set_window(config.tap_window_ms);
                let previous = std::mem::replace(&mut model.layout, layout);
                model.config = config;
                info!(main = %model.layout.main(), lists = %model.layout.lists_root(), "configured");
                Self::reopen_sessions(model, caps, &previous);
            }

            Event::SignInRequested => {
                if model.auth != AuthState::SignedOut {
                    debug!("sign-in already in progress or complete");
                    return;
                }
                model.auth = AuthState::SigningIn;
                model.alert = None;
                caps.auth.sign_in(Event::SignInFinished);
                caps.render.render();
            }

            Event::SignInFinished(Ok(())) => {
                debug!("sign-in popup completed");
            }

            Event::SignInFinished(Err(failure)) => {
                if model.auth == AuthState::SigningIn {
                    model.auth = AuthState::SignedOut;
                }
                let code = failure.code();
                match AppError::from_sign_in_failure(&code) {
                    Some(alert) => {
                        warn!(code = %failure.code, message = %failure.message, "sign-in failed");
                        model.alert = Some(alert);
                    }
                    None => debug!(code = %failure.code, "sign-in dismissed"),
                }
                caps.render.render();
            }

            Event::SignOutRequested => {
                caps.auth.sign_out();
            }

            Event::AuthStateChanged(Some(user)) => {
                Self::signed_in(model, caps, user);
                caps.render.render();
            }

            Event::AuthStateChanged(None) => {
                Self::signed_out(model, caps);
                caps.render.render();
            }

            Event::AlertDismissed => {
                model.alert = None;
                caps.render.render();
            }

            Event::AddItemRequested { text } => {
                let Some(collection) = model.active_collection().cloned() else {
                    warn!("add item with no active list");
                    return;
                };
                let gateway = MutationGateway::new(&caps.store, &model.layout);
                match gateway.add_item(&collection, &text) {
                    Ok(Some(key)) => debug!(%collection, %key, "item added"),
                    Ok(None) => debug!("blank item ignored"),
                    Err(e) => warn!(%collection, error = %e, "add item failed"),
                }
            }

            Event::ItemTapped { id, input, at_ms } => {
                if !model.taps.accept(&id, input, at_ms) {
                    debug!(%id, "duplicate tap ignored");
                    return;
                }
                let Some(collection) = model.active_collection() else {
                    return;
                };
                let gateway = MutationGateway::new(&caps.store, &model.layout);
                if let Err(e) = gateway.toggle_displayed(collection, &id, model.items.rendered()) {
                    warn!(%collection, %id, error = %e, "toggle failed");
                }
            }

            Event::ItemSwiped { id } => {
                let Some(collection) = model.active_collection() else {
                    return;
                };
                let gateway = MutationGateway::new(&caps.store, &model.layout);
                if let Err(e) = gateway.delete_item(collection, &id) {
                    warn!(%collection, %id, error = %e, "delete item failed");
                }
            }

            Event::SelectList(collection) => {
                if !model.auth.is_signed_in() {
                    warn!(%collection, "list selected while signed out");
                    return;
                }
                Self::select_collection(model, caps, collection, true);
                caps.render.render();
            }

            Event::CreateListRequested { name } => {
                if !model.auth.is_signed_in() {
                    warn!("list creation while signed out");
                    return;
                }
                let gateway = MutationGateway::new(&caps.store, &model.layout);
                let created = gateway.create_list(
                    &name,
                    i64::try_from(crate::now_ms()).unwrap_or(i64::MAX),
                    &model.config.default_list_name_format,
                );
                match created {
                    Ok(list_id) => {
                        Self::select_collection(model, caps, CollectionId::Custom(list_id), true);
                        caps.render.render();
                    }
                    Err(e) => warn!(error = %e, "create list failed"),
                }
            }

            Event::DeleteListRequested { list_id } => {
                if CollectionId::from_persisted(&list_id).is_main() {
                    warn!("{MAIN_LIST_NAME} cannot be deleted");
                    return;
                }
                let prompt = Self::delete_prompt(model, &list_id);
                let (id, superseded) = model
                    .confirm
                    .open(ConfirmAction::DeleteList { list_id }, prompt);
                if let Some(previous) = superseded {
                    debug!(id = %previous.id, "earlier confirmation superseded");
                }
                debug!(%id, "confirmation requested");
                caps.render.render();
            }

            Event::ConfirmationResolved { id, confirmed } => {
                match model.confirm.resolve(id, confirmed) {
                    Some(Resolution {
                        action: ConfirmAction::DeleteList { list_id },
                        outcome: ConfirmOutcome::Confirmed,
                        ..
                    }) => Self::delete_list(model, caps, list_id),
                    Some(_) => debug!(%id, "confirmation declined"),
                    None => debug!(%id, "stale confirmation ignored"),
                }
                caps.render.render();
            }

            Event::SnapshotDelivered {
                subscription,
                response,
            } => {
                let changed = match (subscription.kind, response.into_result()) {
                    (SessionKind::Items, Ok(snapshot)) => {
                        match model.items.on_snapshot(subscription, &snapshot) {
                            Some(changes) => {
                                model.last_changes = changes;
                                model.render_pass += 1;
                                true
                            }
                            None => false,
                        }
                    }
                    (SessionKind::Lists, Ok(snapshot)) => {
                        match model.lists.on_snapshot(subscription, &snapshot) {
                            Some(changes) => {
                                Self::lists_changed(model, caps, &changes);
                                true
                            }
                            None => false,
                        }
                    }
                    (SessionKind::Items, Err(e)) => model.items.on_error(subscription, &e),
                    (SessionKind::Lists, Err(e)) => model.lists.on_error(subscription, &e),
                };
                if changed {
                    caps.render.render();
                }
            }

            Event::ReadCompleted { token, response } => {
                if let Some(step) = model.bootstrap.on_meta_read(token, response.into_result()) {
                    Self::apply_bootstrap_step(model, caps, step);
                    caps.render.render();
                }
            }

            Event::PreferenceLoaded { token, response } => {
                let stored = response.unwrap_or_else(|e| {
                    warn!(error = %e, "could not read last list preference");
                    None
                });
                if let Some(step) = model.bootstrap.on_preference(token, stored) {
                    Self::apply_bootstrap_step(model, caps, step);
                    caps.render.render();
                }
            }

            Event::PreferenceWritten(Ok(())) => {
                debug!("last list preference written");
            }

            Event::PreferenceWritten(Err(e)) => {
                warn!(error = %e, "could not write last list preference");
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}
