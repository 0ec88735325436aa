use crate::riot::client::RiotClient;
use crate::riot::error::{RiotApiResponse, RiotMatchError};
use crate::riot::types::{MatchDto, MatchStats};

impl RiotClient {
    pub(crate) fn match_ids_url(&self, region_code: &str, puuid: &str, count: u32) -> String {
        format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start=0&count={}",
            self.cluster_url(region_code),
            puuid,
            count
        )
    }

    pub(crate) fn match_url(&self, region_code: &str, match_id: &str) -> String {
        format!(
            "{}/lol/match/v5/matches/{}",
            self.cluster_url(region_code),
            match_id
        )
    }

    /// Get list of match IDs by PUUID, newest first
    /// Uses regional routing (americas, europe, asia, sea)
    pub fn get_match_ids(
        &self,
        region_code: &str,
        puuid: &str,
        count: u32,
    ) -> RiotApiResponse<Vec<String>> {
        self.request(&self.match_ids_url(region_code, puuid, count))
    }

    /// Get match details by match ID
    pub fn get_match(&self, region_code: &str, match_id: &str) -> RiotApiResponse<MatchDto> {
        self.request(&self.match_url(region_code, match_id))
    }

    /// Fetch a match and extract the stats of the given account.
    pub fn get_match_stats(
        &self,
        region_code: &str,
        match_id: &str,
        puuid: &str,
    ) -> Result<MatchStats, RiotMatchError> {
        let dto = self.get_match(region_code, match_id)?;
        let participant =
            dto.info
                .participant(puuid)
                .ok_or_else(|| RiotMatchError::PuuidNotInMatch {
                    match_id: match_id.to_string(),
                })?;

        Ok(MatchStats::from_participant(match_id, &dto.info, participant))
    }
}
