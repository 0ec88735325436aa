use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::types::AccountDto;

impl RiotClient {
    pub(crate) fn account_url(&self, region_code: &str, game_name: &str, tag_line: &str) -> String {
        format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.cluster_url(region_code),
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        )
    }

    /// Get account by Riot ID (game name + tag line)
    /// Uses regional routing (americas, europe, asia, sea)
    pub fn get_account_by_riot_id(
        &self,
        region_code: &str,
        game_name: &str,
        tag_line: &str,
    ) -> RiotApiResponse<AccountDto> {
        self.request(&self.account_url(region_code, game_name, tag_line))
    }
}
