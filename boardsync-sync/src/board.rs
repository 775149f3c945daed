//! Board operations: local mutations that go through the store and out
//! through the transport queue.

use crate::assets::AssetManager;
use crate::error::SyncResult;
use crate::session::SyncSession;
use boardsync_model::{
    Asset, BoardEntity, DeleteAction, Grid, Position, Replicated, Scene, Token, TokenData,
    TokenDataBody, TokenVariant, TurnOrder,
};
use boardsync_store::StoreError;
use boardsync_types::{Action, Uid};
use tracing::{debug, trace, warn};

type Hook<'a> = Box<dyn FnOnce(&DeleteAction) + 'a>;

/// Callbacks around [`SyncSession::remove_and_flush`].
///
/// The sequence is fixed (remove, before_flush, flush, after_flush,
/// before_cleanup, cleanup, after_cleanup); callers choose what runs at
/// each step.
#[derive(Default)]
pub struct RemovalHooks<'a> {
    before_flush: Option<Hook<'a>>,
    after_flush: Option<Hook<'a>>,
    before_cleanup: Option<Hook<'a>>,
    after_cleanup: Option<Hook<'a>>,
}

impl<'a> RemovalHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_flush(mut self, hook: impl FnOnce(&DeleteAction) + 'a) -> Self {
        self.before_flush = Some(Box::new(hook));
        self
    }

    pub fn after_flush(mut self, hook: impl FnOnce(&DeleteAction) + 'a) -> Self {
        self.after_flush = Some(Box::new(hook));
        self
    }

    pub fn before_cleanup(mut self, hook: impl FnOnce(&DeleteAction) + 'a) -> Self {
        self.before_cleanup = Some(Box::new(hook));
        self
    }

    pub fn after_cleanup(mut self, hook: impl FnOnce(&DeleteAction) + 'a) -> Self {
        self.after_cleanup = Some(Box::new(hook));
        self
    }
}

fn run(hook: Option<Hook<'_>>, action: &DeleteAction) {
    if let Some(hook) = hook {
        hook(action);
    }
}

fn missing(uid: &Uid, expected: &'static str) -> StoreError {
    StoreError::MissingRequiredEntity {
        uid: uid.clone(),
        expected,
    }
}

impl SyncSession {
    /// Registers a locally created entity and queues its create record.
    fn create(&mut self, entity: impl Into<BoardEntity>) -> SyncResult<Uid> {
        let uid = self.store.add(entity)?;
        if let Some(entity) = self.store.get(&uid) {
            self.queue.queue(entity, Action::Create);
        }
        Ok(uid)
    }

    /// Creates a scene with a default grid, and sends both.
    pub fn create_scene(&mut self, name: &str) -> SyncResult<Uid> {
        let grid_uid = self.create(Grid::new(self.next_uid()))?;
        let scene_uid = self.create(Scene::new(self.next_uid(), name, grid_uid))?;
        debug!("Created scene {} ({})", scene_uid, name);
        self.flush()?;
        Ok(scene_uid)
    }

    /// Creates token data. Queued, not flushed; it usually goes out with
    /// the token that displays it.
    pub fn create_token_data(&mut self, body: TokenDataBody) -> SyncResult<Uid> {
        let data = TokenData::new(self.next_uid(), body);
        self.create(data)
    }

    /// Places a token on a scene and sends the queued batch.
    ///
    /// Fails with [`StoreError::MissingRequiredEntity`] if the scene or a
    /// token data of a kind the variant accepts is not in the store.
    pub fn create_token(
        &mut self,
        variant: TokenVariant,
        scene_uid: &Uid,
        token_data_uid: &Uid,
        position: Position,
    ) -> SyncResult<Uid> {
        if self.store.scene(scene_uid).is_none() {
            return Err(missing(scene_uid, "Scene").into());
        }
        match self.store.token_data(token_data_uid) {
            Some(data) if variant.accepts_data(&data.kind()) => {}
            _ => return Err(missing(token_data_uid, "TokenData").into()),
        }

        let mut token = Token::new(
            variant,
            self.next_uid(),
            scene_uid.clone(),
            token_data_uid.clone(),
        );
        token.position = position;
        let uid = self.create(token)?;
        if let Some(scene) = self.store.scene_mut(scene_uid) {
            scene.attach_token(uid.clone());
        }
        self.flush()?;
        Ok(uid)
    }

    /// Loads the data's image before announcing data and token, so peers
    /// never see a token whose image this client could not load.
    pub async fn create_token_with_image(
        &mut self,
        assets: &AssetManager,
        variant: TokenVariant,
        scene_uid: &Uid,
        body: TokenDataBody,
        position: Position,
    ) -> SyncResult<(Uid, Uid)> {
        let image = match &body {
            TokenDataBody::Character(data) => data.image.clone(),
            TokenDataBody::Decoration(data) => data.image.clone(),
            TokenDataBody::Empty => None,
        };
        if let Some(url) = image.filter(|url| !url.is_empty()) {
            assets.get(&url).await?;
        }
        if self.store.scene(scene_uid).is_none() {
            return Err(missing(scene_uid, "Scene").into());
        }
        let data_uid = self.create_token_data(body)?;
        let token_uid = self.create_token(variant, scene_uid, &data_uid, position)?;
        Ok((data_uid, token_uid))
    }

    /// Places a local-only copy of a token (drag preview). Never sent.
    pub fn create_ghost(&mut self, token_uid: &Uid) -> SyncResult<Uid> {
        let ghost = self
            .store
            .token(token_uid)
            .ok_or_else(|| missing(token_uid, "Token"))?
            .ghost(self.next_uid());
        Ok(self.store.add(ghost)?)
    }

    /// Gives a scene a new turn order, replacing (and deleting) the old one.
    /// Participants that are not live token data are dropped.
    pub fn create_turn_order(
        &mut self,
        scene_uid: &Uid,
        participants: &[Uid],
    ) -> SyncResult<Uid> {
        let previous = self
            .store
            .scene(scene_uid)
            .ok_or_else(|| missing(scene_uid, "Scene"))?
            .turn_order()
            .cloned();

        let mut turn_order = TurnOrder::new(self.next_uid(), scene_uid.clone());
        for uid in participants {
            if self.store.token_data(uid).is_some() {
                turn_order.add_participant(uid.clone());
            } else {
                warn!("Turn order skips unknown token data {}", uid);
            }
        }

        if let Some(previous) = previous {
            let mut action = self.store.remove(&previous);
            self.queue_deletes(&action);
            action.run_cleanup();
        }

        let uid = self.create(turn_order)?;
        if let Some(scene) = self.store.scene_mut(scene_uid) {
            scene.set_turn_order(Some(uid.clone()));
        }
        self.flush()?;
        Ok(uid)
    }

    /// Edits a live entity and queues an update. Not flushed.
    pub fn update<R>(&mut self, uid: &Uid, edit: impl FnOnce(&mut BoardEntity) -> R) -> SyncResult<R> {
        let result = self.store.update_with(uid, edit)?;
        if let Some(entity) = self.store.get(uid) {
            self.queue.queue(entity, Action::Update);
        }
        Ok(result)
    }

    /// Adds an asset to the game's library and sends the update.
    pub fn add_game_asset(&mut self, asset: Asset) -> SyncResult<()> {
        let uid = self
            .store
            .game_assets()
            .map(|assets| assets.uid().clone())
            .ok_or_else(|| missing(&Uid::from_string(""), "GameAssets"))?;
        self.update(&uid, |entity| {
            if let Some(assets) = entity.as_game_assets_mut() {
                assets.add_asset(asset);
            }
        })?;
        self.flush()?;
        Ok(())
    }

    /// Removes an entity with its delete closure, announces the deletes,
    /// and runs cleanup, calling the hooks in between.
    ///
    /// Pending creates and updates for removed entities are cancelled so a
    /// stale reference is never sent. Cleanup runs even if the flush fails;
    /// the flush error is returned afterwards.
    pub fn remove_and_flush(
        &mut self,
        uid: &Uid,
        hooks: RemovalHooks<'_>,
    ) -> SyncResult<DeleteAction> {
        if !self.store.contains(uid) {
            return Err(missing(uid, "entity").into());
        }
        let mut action = self.store.remove(uid);
        self.queue_deletes(&action);

        run(hooks.before_flush, &action);
        let flushed = self.flush();
        if flushed.is_ok() {
            run(hooks.after_flush, &action);
        }
        run(hooks.before_cleanup, &action);
        action.run_cleanup();
        run(hooks.after_cleanup, &action);

        flushed?;
        Ok(action)
    }

    /// Cancels queued entries for every removed entity and queues a delete
    /// for each one that was replicated. An entity whose create never left
    /// the queue is unknown to peers and gets no delete.
    fn queue_deletes(&mut self, action: &DeleteAction) {
        for entity in action.removed() {
            let unsent = self.queue.contains(entity.uid(), Action::Create);
            self.queue.cancel(entity.uid());
            if entity.is_local_only() || unsent {
                trace!("Dropping {} {} without a remote delete", entity.kind(), entity.uid());
                continue;
            }
            self.queue
                .queue_uid(entity.uid().clone(), entity.kind(), Action::Delete);
        }
    }
}
