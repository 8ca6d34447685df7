use crate::browser;
use crate::engine::{self, Textures};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;

// ==================== Document ====================
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MagicWords {
    pub characters: Vec<CharacterData>,
    pub dialogue: Vec<DialogueLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterData {
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DialogueLine {
    #[serde(rename = "name")]
    pub speaker: String,
    pub text: String,
}

/// Where the dialogue scene gets its document from
#[async_trait(?Send)]
pub trait DialogueSource {
    async fn load(&self) -> Result<MagicWords>;
}

pub struct RemoteDialogue {
    endpoint: String,
}

impl RemoteDialogue {
    pub fn new(endpoint: impl Into<String>) -> Self {
        RemoteDialogue {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait(?Send)]
impl DialogueSource for RemoteDialogue {
    async fn load(&self) -> Result<MagicWords> {
        browser::fetch_json::<MagicWords>(&self.endpoint)
            .await
            .with_context(|| format!("Failed to load dialogue from : {}", self.endpoint))
    }
}

/// Fetch the document, then every avatar it names in parallel into
/// `textures`
/// - avatar failures are logged, the sprite just stays invisible
pub async fn load_with_avatars(source: &impl DialogueSource, textures: &Textures) -> Result<MagicWords> {
    let words = source.load().await?;
    {
        let mut loads: FuturesUnordered<_> = words
            .characters
            .iter()
            .filter(|character| !textures.borrow().contains_key(&character.avatar))
            .map(|character| async move { (character, engine::load_image(&character.avatar).await) })
            .collect();

        while let Some((character, result)) = loads.next().await {
            match result {
                Ok(image) => {
                    textures.borrow_mut().insert(character.avatar.clone(), image);
                }
                Err(err) => error!("Avatar for {} unavailable : {:#}", character.name, err),
            }
        }
    }
    Ok(words)
}

/// Run [`load_with_avatars`] in the background and deliver the document
/// through the returned receiver
/// - a receiver dropped before delivery discards the result
pub fn spawn_load(
    source: impl DialogueSource + 'static,
    textures: Textures,
) -> oneshot::Receiver<Result<MagicWords>> {
    let (tx, rx) = oneshot::channel();
    browser::spawn_local(async move {
        let result = load_with_avatars(&source, &textures).await;
        let _ = tx.send(result);
    });
    rx
}
