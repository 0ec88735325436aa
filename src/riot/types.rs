use serde::Deserialize;

// ============================================================================
// Account-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

/// A Riot ID resolved to its stable account identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
}

impl AccountIdentity {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

// ============================================================================
// Match-v5
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub info: InfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    #[serde(default)]
    pub game_creation: i64,
    #[serde(default)]
    pub game_duration: i64,
    pub participants: Vec<ParticipantDto>,
}

impl InfoDto {
    pub fn participant(&self, puuid: &str) -> Option<&ParticipantDto> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }

    pub fn team_kills(&self, team_id: i32) -> u32 {
        self.participants
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.kills)
            .sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    #[serde(default)]
    pub team_id: i32,
    #[serde(default = "unknown_champion")]
    pub champion_name: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub win: bool,
    #[serde(default)]
    pub total_minions_killed: u32,
    #[serde(default)]
    pub neutral_minions_killed: u32,
}

fn unknown_champion() -> String {
    "Unknown".to_string()
}

impl ParticipantDto {
    pub fn cs_total(&self) -> u32 {
        self.total_minions_killed + self.neutral_minions_killed
    }

    pub fn cs_per_minute(&self, game_duration_secs: i64) -> f64 {
        if game_duration_secs <= 0 {
            0.0
        } else {
            self.cs_total() as f64 / (game_duration_secs as f64 / 60.0)
        }
    }

    /// Kill participation in percent against the given team kill total.
    pub fn kill_participation(&self, team_kills: u32) -> f64 {
        if team_kills == 0 {
            0.0
        } else {
            (self.kills + self.assists) as f64 / team_kills as f64 * 100.0
        }
    }
}

/// Outcome of one match from the point of view of a single account.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStats {
    pub match_id: String,
    pub champion_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
    pub kp_percent: f64,
    pub cs: u32,
    pub cs_per_min: f64,
    /// Epoch milliseconds.
    pub game_creation: i64,
    /// Seconds.
    pub game_duration: i64,
}

impl MatchStats {
    pub fn from_participant(match_id: &str, info: &InfoDto, participant: &ParticipantDto) -> Self {
        Self {
            match_id: match_id.to_string(),
            champion_name: participant.champion_name.clone(),
            kills: participant.kills,
            deaths: participant.deaths,
            assists: participant.assists,
            win: participant.win,
            kp_percent: participant.kill_participation(info.team_kills(participant.team_id)),
            cs: participant.cs_total(),
            cs_per_min: participant.cs_per_minute(info.game_duration),
            game_creation: info.game_creation,
            game_duration: info.game_duration,
        }
    }

    pub fn kda_ratio(&self) -> f64 {
        if self.deaths == 0 {
            (self.kills + self.assists) as f64
        } else {
            (self.kills + self.assists) as f64 / self.deaths as f64
        }
    }
}
