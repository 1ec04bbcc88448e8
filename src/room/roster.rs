use serde::Serialize;

pub const GUEST: &str = "Guest";

/// Trimmed nickname, or "Guest" when nothing usable was sent.
pub fn display_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _                        => GUEST.to_string(),
    }
}

fn avatar_ref(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id:             String,
    pub nickname:       String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar:         Option<String>,
    pub is_owner:       bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing:        Option<bool>,
    #[serde(skip)]
    pub last_seq:       Option<u64>,
}

/// Self-reported player position of one participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub current_time:   f64,
    pub video_progress: f64,
    pub playing:        bool,
    pub seq:            Option<u64>,
}

/// Connected participants in join order. Owner is unique while non-empty.
#[derive(Debug, Default)]
pub struct Roster {
    members: Vec<Participant>,
}

impl Roster {
    /// Adds (or refreshes) a member; the first member of an empty roster owns the room.
    pub fn join(&mut self, id: &str, nickname: Option<&str>, avatar: Option<&str>) -> &Participant {
        if let Some(pos) = self.position(id) {
            let p = &mut self.members[pos];
            p.nickname = display_name(nickname);
            p.avatar   = avatar_ref(avatar);
            return &self.members[pos];
        }
        let is_owner = self.members.is_empty();
        self.members.push(Participant {
            id:             id.to_string(),
            nickname:       display_name(nickname),
            avatar:         avatar_ref(avatar),
            is_owner,
            current_time:   None,
            video_progress: None,
            playing:        None,
            last_seq:       None,
        });
        &self.members[self.members.len() - 1]
    }

    /// Removes a member and hands ownership to the earliest remaining one if needed.
    pub fn leave(&mut self, id: &str) -> Option<Participant> {
        let gone = self.members.remove(self.position(id)?);
        if !self.members.iter().any(|p| p.is_owner) {
            if let Some(first) = self.members.first_mut() {
                first.is_owner = true;
            }
        }
        Some(gone)
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.members.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.members.iter_mut().find(|p| p.id == id)
    }

    pub fn set_profile(&mut self, id: &str, nickname: Option<&str>, avatar: Option<&str>) -> Option<&Participant> {
        let p = self.get_mut(id)?;
        p.nickname = display_name(nickname);
        p.avatar   = avatar_ref(avatar);
        Some(p)
    }

    /// Last-write-wins, except that a sequenced update never rolls back a newer one.
    /// Returns the last applied seq on rejection.
    pub fn report(&mut self, id: &str, t: Telemetry) -> Option<Result<(), u64>> {
        let p = self.get_mut(id)?;
        if let (Some(seq), Some(last)) = (t.seq, p.last_seq) {
            if seq <= last {
                return Some(Err(last));
            }
        }
        p.current_time   = Some(t.current_time);
        p.video_progress = Some(t.video_progress);
        p.playing        = Some(t.playing);
        if t.seq.is_some() {
            p.last_seq = t.seq;
        }
        Some(Ok(()))
    }

    pub fn nickname_of(&self, id: &str) -> String {
        self.get(id).map_or_else(|| GUEST.to_string(), |p| p.nickname.clone())
    }

    pub fn members(&self) -> &[Participant] { &self.members }
    pub fn len(&self) -> usize { self.members.len() }
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    fn position(&self, id: &str) -> Option<usize> {
        self.members.iter().position(|p| p.id == id)
    }
}
