use serde::Serialize;
use tracing::debug;

use crate::catalog::{DataAccess, EntityId, University};

use super::{
    profile::ProfileCache,
    scoring::{CompositeScorer, Signals, SimilarityPolicy},
    vectorize::similarities,
    Recommender,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarEntity {
    pub id: EntityId,
    pub label: String,
    pub country: String,
    pub score: f64,
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    /// Universities ranked by whole-profile textual similarity to `target_id`.
    pub fn find_similar(&self, target_id: EntityId, top_n: usize) -> Vec<SimilarEntity> {
        let mut cache = self.cache();
        self.similar_with(&mut cache, target_id, top_n)
    }

    pub(super) fn similar_with(
        &self,
        cache: &mut ProfileCache,
        target_id: EntityId,
        top_n: usize,
    ) -> Vec<SimilarEntity> {
        let Some(target) = cache.get_or_build(self.data, target_id) else {
            debug!(target_id, "similar search for unknown entity");
            return Vec::new();
        };

        let mut peers: Vec<&University> = Vec::new();
        let mut documents: Vec<String> = Vec::new();
        for university in self.data.universities() {
            if university.id == target_id {
                continue;
            }
            let Some(profile) = cache.get_or_build(self.data, university.id) else {
                continue;
            };
            let document = profile.document(true);
            if document.trim().is_empty() {
                continue;
            }
            peers.push(university);
            documents.push(document);
        }

        if peers.is_empty() {
            return Vec::new();
        }

        let sims = similarities(&target.document(true), &documents);
        let candidates = peers
            .into_iter()
            .zip(sims)
            .map(|(university, similarity)| {
                (
                    university,
                    Signals {
                        similarity,
                        ..Default::default()
                    },
                )
            })
            .collect();

        let ranked = CompositeScorer::new(SimilarityPolicy)
            .with_precision(4)
            .rank(candidates, top_n, |u: &&University| u.name.as_str());

        debug!(target_id, returned = ranked.len(), "similar entities ranked");

        ranked
            .into_iter()
            .map(|scored| SimilarEntity {
                id: scored.item.id,
                label: scored.item.name.clone(),
                country: scored.item.country.clone(),
                score: scored.score,
            })
            .collect()
    }
}
