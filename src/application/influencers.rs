//! Influencer profile registration and maintenance.
//!
//! An influencer record is created exactly once per user and updated in
//! place. It is never created implicitly by blog activity; its presence is
//! what makes a user visible to the top-influencers ranking.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::application::repos::{
    InfluencerProfileParams, InfluencersRepo, RepoError, with_deadline,
};
use crate::domain::entities::InfluencerRecord;

#[derive(Debug, Error)]
pub enum InfluencerError {
    #[error("user is already registered as an influencer")]
    AlreadyRegistered,
    #[error("influencer profile not found")]
    ProfileNotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct InfluencerService {
    influencers: Arc<dyn InfluencersRepo>,
    store_deadline: Duration,
}

impl InfluencerService {
    pub fn new(influencers: Arc<dyn InfluencersRepo>, store_deadline: Duration) -> Self {
        Self {
            influencers,
            store_deadline,
        }
    }

    #[instrument(skip(self, params), fields(user = %params.user_id))]
    pub async fn register(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, InfluencerError> {
        match with_deadline(self.store_deadline, self.influencers.create_profile(params)).await {
            Ok(record) => Ok(record),
            Err(RepoError::Duplicate { .. }) => Err(InfluencerError::AlreadyRegistered),
            Err(other) => Err(other.into()),
        }
    }

    #[instrument(skip(self, params), fields(user = %params.user_id))]
    pub async fn update(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, InfluencerError> {
        match with_deadline(self.store_deadline, self.influencers.update_profile(params)).await {
            Ok(record) => Ok(record),
            Err(RepoError::NotFound) => Err(InfluencerError::ProfileNotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn profile_of(
        &self,
        user_id: Uuid,
    ) -> Result<Option<InfluencerRecord>, RepoError> {
        with_deadline(self.store_deadline, self.influencers.find_by_user(user_id)).await
    }
}
