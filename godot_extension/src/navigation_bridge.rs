//! Navigation Trial Bridge for Godot
//!
//! Godot 씬과 nav_core 의 NavigationTask 를 연결하는 브릿지.
//! GDScript 는 매 프레임 아바타 위치를 넘기고, 응답 JSON 의 HUD 이벤트와
//! 로그 라인을 씬에 적용한다.

use chrono::Timelike;
use godot::prelude::*;
use nav_core::host::{HudEvent, HudRecorder, LogRecorder, ManualClock, ScriptedAvatar};
use nav_core::{
    Destination, DestinationList, DestinationProvider, FrameInput, NavigationConfig,
    NavigationTask, SceneObject, TaskBindings, TaskError, TrialContext,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Destination entry of `configure`'s destinations JSON
#[derive(Debug, Clone, Deserialize)]
struct DestinationEntry {
    id: u32,
    name: String,
    position: [f32; 3],
}

/// Bridge-side error: message + code for the GDScript side
#[derive(Debug, Clone, PartialEq)]
struct BridgeError {
    message: String,
    code: &'static str,
}

impl BridgeError {
    fn new(message: impl Into<String>, code: &'static str) -> Self {
        Self { message: message.into(), code }
    }

    fn not_configured() -> Self {
        Self::new("Navigation task not configured", "NOT_CONFIGURED")
    }
}

impl From<TaskError> for BridgeError {
    fn from(err: TaskError) -> Self {
        let code = match &err {
            TaskError::NoCurrentTarget | TaskError::EmptyDestinations => "NO_TARGET",
            TaskError::UnknownObject { .. } => "UNKNOWN_OBJECT",
            TaskError::InvalidTransition { .. } => "INVALID_STATE",
            TaskError::Serialization(_) | TaskError::Yaml(_) => "PARSE_ERROR",
            TaskError::InvalidConfig(_) => "INVALID_CONFIG",
        };
        Self::new(err.to_string(), code)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string(), "PARSE_ERROR")
    }
}

type BridgeResult<T> = std::result::Result<T, BridgeError>;

fn to_nav(v: Vector3) -> nalgebra::Vector3<f32> {
    nalgebra::Vector3::new(v.x, v.y, v.z)
}

/// Engine-independent half of the bridge
struct BridgeSession {
    task: NavigationTask,
    destinations: DestinationList,
    avatar: ScriptedAvatar,
    scaled_avatar: Option<ScriptedAvatar>,
    clock: ManualClock,
    hud: HudRecorder,
    log: LogRecorder,
}

impl BridgeSession {
    fn new(config_json: &str, destinations_json: &str, scaled: bool) -> BridgeResult<Self> {
        let config = if config_json.trim().is_empty() {
            NavigationConfig::default()
        } else {
            NavigationConfig::from_json(config_json)?
        };

        let entries: Vec<DestinationEntry> = serde_json::from_str(destinations_json)?;
        let destinations = DestinationList::new(
            entries
                .into_iter()
                .map(|d| {
                    let [x, y, z] = d.position;
                    Destination::new(d.id, d.name, nalgebra::Vector3::new(x, y, z))
                })
                .collect(),
        )?;

        let avatar = ScriptedAvatar::at(nalgebra::Vector3::zeros());
        let scaled_avatar = scaled.then(|| ScriptedAvatar::at(nalgebra::Vector3::zeros()));
        let clock = ManualClock::new();
        let hud = HudRecorder::new();
        let log = LogRecorder::new();

        let mut bindings =
            TaskBindings::new(hud.clone(), log.clone(), avatar.clone(), clock.clone());
        if let Some(scaled) = &scaled_avatar {
            bindings = bindings.with_scaled_avatar(scaled.clone());
        }

        let task = NavigationTask::new(config, bindings)?;
        Ok(Self { task, destinations, avatar, scaled_avatar, clock, hud, log })
    }

    fn move_avatars(&self, avatar: nalgebra::Vector3<f32>, scaled: nalgebra::Vector3<f32>) {
        self.avatar.move_to(avatar);
        if let Some(scaled_avatar) = &self.scaled_avatar {
            scaled_avatar.move_to(scaled);
        }
    }

    fn sync_wall_clock(&self) {
        self.clock.set_wall_second(chrono::Local::now().second());
    }

    fn start_trial(
        &mut self,
        context_json: &str,
        avatar: nalgebra::Vector3<f32>,
        scaled: nalgebra::Vector3<f32>,
    ) -> BridgeResult<Value> {
        let context: TrialContext = serde_json::from_str(context_json)?;
        self.move_avatars(avatar, scaled);
        self.sync_wall_clock();
        self.task.start(&mut self.destinations, context)?;
        Ok(self.response(json!({})))
    }

    fn tick(
        &mut self,
        dt: f32,
        avatar: nalgebra::Vector3<f32>,
        scaled: nalgebra::Vector3<f32>,
        manual_reveal: bool,
    ) -> BridgeResult<Value> {
        self.move_avatars(avatar, scaled);
        self.clock.advance(f64::from(dt.max(0.0)));
        self.sync_wall_clock();
        let completed = self.task.tick(&mut self.destinations, dt, FrameInput { manual_reveal })?;
        Ok(self.response(json!({ "completed": completed })))
    }

    fn contact(&mut self, object_id: u32, parent_id: Option<u32>) -> Value {
        let hit = match parent_id {
            Some(parent) => SceneObject::child_of(object_id, parent),
            None => SceneObject::new(object_id),
        };
        let reached = self.task.on_contact(&self.destinations, hit);
        self.response(json!({ "reached": reached }))
    }

    fn pause(&mut self) -> BridgeResult<Value> {
        self.task.pause()?;
        Ok(self.response(json!({})))
    }

    fn resume(&mut self) -> BridgeResult<Value> {
        self.task.resume()?;
        Ok(self.response(json!({})))
    }

    fn end_trial(&mut self) -> BridgeResult<Value> {
        let record = self.task.end(&mut self.destinations)?;
        let record = match record {
            Some(r) => serde_json::to_value(&r)?,
            None => Value::Null,
        };
        Ok(self.response(json!({ "record": record })))
    }

    fn destination_states(&self) -> Value {
        let current = self.destinations.current_target().map(|d| d.id.0);
        let states: Vec<Value> = self
            .destinations
            .all_targets()
            .iter()
            .map(|d| {
                json!({
                    "id": d.id.0,
                    "name": d.name,
                    "active": d.active,
                    "renderer_enabled": d.renderer_enabled,
                    "current": Some(d.id.0) == current,
                })
            })
            .collect();
        json!({ "success": true, "destinations": states })
    }

    /// Success response with the HUD events and log lines since the last call
    fn response(&self, mut extra: Value) -> Value {
        let hud_events: Vec<HudEvent> = self.hud.drain();
        let log_lines: Vec<String> = self.log.drain().into_iter().map(|e| e.line).collect();

        let mut body = json!({
            "success": true,
            "state": self.task.state().name(),
            "score": self.task.score(),
            "hud_events": hud_events,
            "log_lines": log_lines,
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object_mut()) {
            body.append(extra);
        }
        body
    }
}

/// Navigation Bridge - GDScript 에서 NavigationTask 를 구동
#[derive(GodotClass)]
#[class(base=RefCounted)]
pub struct NavigationBridge {
    base: Base<RefCounted>,
    session: Option<BridgeSession>,
}

#[godot_api]
impl IRefCounted for NavigationBridge {
    fn init(base: Base<RefCounted>) -> Self {
        godot_print!("NavigationBridge initialized");
        Self { base, session: None }
    }
}

#[godot_api]
impl NavigationBridge {
    /// 태스크 설정
    ///
    /// # Arguments
    /// * `config_json` - NavigationConfig JSON (빈 문자열이면 기본값)
    /// * `destinations_json` - `[{"id", "name", "position": [x, y, z]}]`
    /// * `scaled` - scaled avatar 를 함께 추적할지 여부
    #[func]
    pub fn configure(
        &mut self,
        config_json: GString,
        destinations_json: GString,
        scaled: bool,
    ) -> GString {
        let config = config_json.to_string();
        let destinations = destinations_json.to_string();
        match BridgeSession::new(&config, &destinations, scaled) {
            Ok(session) => {
                log::info!(
                    "Navigation task configured: {} destinations, scaled={}",
                    session.destinations.len(),
                    scaled
                );
                self.session = Some(session);
                let response = json!({
                    "success": true,
                    "message": "Navigation task configured"
                });
                GString::from(response.to_string().as_str())
            }
            Err(err) => {
                godot_error!("NavigationBridge configure failed: {}", err.message);
                self.create_error_response(&err.message, err.code)
            }
        }
    }

    /// 트라이얼 시작
    ///
    /// # Arguments
    /// * `context_json` - `{"task_name", "block_repeat", "trial_repeat", "trial_label"}`
    #[func]
    pub fn start_trial(
        &mut self,
        context_json: GString,
        avatar_pos: Vector3,
        scaled_pos: Vector3,
    ) -> GString {
        let context = context_json.to_string();
        self.with_session(|s| s.start_trial(&context, to_nav(avatar_pos), to_nav(scaled_pos)))
    }

    /// 매 프레임 호출. `completed` 가 true 면 end_trial 을 호출할 것
    #[func]
    pub fn tick(
        &mut self,
        dt: f64,
        avatar_pos: Vector3,
        scaled_pos: Vector3,
        manual_reveal: bool,
    ) -> GString {
        let (avatar, scaled) = (to_nav(avatar_pos), to_nav(scaled_pos));
        self.with_session(|s| s.tick(dt as f32, avatar, scaled, manual_reveal))
    }

    /// 충돌 통지. 부모가 없으면 `parent_id` 에 음수를 넘긴다
    #[func]
    pub fn contact(&mut self, object_id: i64, parent_id: i64) -> GString {
        let Ok(object_id) = u32::try_from(object_id) else {
            return self.create_error_response("object_id out of range", "UNKNOWN_OBJECT");
        };
        let parent_id = u32::try_from(parent_id).ok();
        self.with_session(|s| Ok(s.contact(object_id, parent_id)))
    }

    #[func]
    pub fn pause(&mut self) -> GString {
        self.with_session(BridgeSession::pause)
    }

    #[func]
    pub fn resume(&mut self) -> GString {
        self.with_session(BridgeSession::resume)
    }

    /// 다음 tick 에서 트라이얼 종료
    #[func]
    pub fn request_kill(&mut self) -> GString {
        self.with_session(|s| {
            s.task.request_kill();
            Ok(s.response(json!({})))
        })
    }

    /// 트라이얼 종료 및 기록 반환
    #[func]
    pub fn end_trial(&mut self) -> GString {
        self.with_session(BridgeSession::end_trial)
    }

    #[func]
    pub fn destination_states(&mut self) -> GString {
        self.with_session(|s| Ok(s.destination_states()))
    }

    /// 빌드 정보 (git hash, build time)
    #[func]
    pub fn get_build_info(&self) -> GString {
        let info = json!({
            "version": nav_core::VERSION,
            "git_hash": env!("GIT_HASH"),
            "build_time_utc": env!("BUILD_TIME_UTC"),
        });
        GString::from(info.to_string().as_str())
    }
}

impl NavigationBridge {
    fn with_session<F>(&mut self, f: F) -> GString
    where
        F: FnOnce(&mut BridgeSession) -> BridgeResult<Value>,
    {
        let result = match self.session.as_mut() {
            Some(session) => f(session),
            None => Err(BridgeError::not_configured()),
        };
        match result {
            Ok(value) => GString::from(value.to_string().as_str()),
            Err(err) => {
                godot_error!("NavigationBridge: {}", err.message);
                self.create_error_response(&err.message, err.code)
            }
        }
    }

    fn create_error_response(&self, message: &str, code: &str) -> GString {
        let response = json!({
            "success": false,
            "error": message,
            "error_code": code
        });
        GString::from(response.to_string().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESTINATIONS: &str = r#"[
        {"id": 1, "name": "Bakery", "position": [10.0, 0.0, 0.0]},
        {"id": 2, "name": "Bank", "position": [0.0, 0.0, 10.0]}
    ]"#;
    const CONTEXT: &str = r#"{
        "task_name": "FindStores", "block_repeat": 1, "trial_repeat": 1, "trial_label": "Nav"
    }"#;

    fn v(x: f32, z: f32) -> nalgebra::Vector3<f32> {
        nalgebra::Vector3::new(x, 0.0, z)
    }

    #[test]
    fn test_full_trial_through_session() {
        let mut session = BridgeSession::new("", DESTINATIONS, false).unwrap();

        let started = session.start_trial(CONTEXT, v(0.0, 0.0), v(0.0, 0.0)).unwrap();
        assert_eq!(started["state"], "active");
        let events = started["hud_events"].as_array().unwrap();
        assert!(events
            .iter()
            .any(|e| e["kind"] == "message" && e["text"] == "Please find the Bakery"));

        session.tick(1.0, v(5.0, 0.0), v(0.0, 0.0), false).unwrap();
        let ticked = session.tick(1.0, v(10.0, 0.0), v(0.0, 0.0), false).unwrap();
        assert_eq!(ticked["completed"], false);

        let reached = session.contact(1, None);
        assert_eq!(reached["reached"], true);

        let ended = session.end_trial().unwrap();
        assert_eq!(ended["state"], "idle");
        assert_eq!(ended["record"]["target_name"], "Bakery");
        assert_eq!(ended["log_lines"].as_array().unwrap().len(), 1);
        let block = ended["log_lines"][0].as_str().unwrap();
        assert!(block.starts_with("LM_OUTPUT\tNavigationTask.cs\tFindStores\tNav\n"));

        let states = session.destination_states();
        assert_eq!(states["destinations"][1]["current"], true);
    }

    #[test]
    fn test_events_are_drained_per_response() {
        let mut session = BridgeSession::new("", DESTINATIONS, false).unwrap();
        session.start_trial(CONTEXT, v(0.0, 0.0), v(0.0, 0.0)).unwrap();
        let ticked = session.tick(0.1, v(1.0, 0.0), v(0.0, 0.0), false).unwrap();
        assert!(ticked["hud_events"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_transition_maps_to_error_code() {
        let mut session = BridgeSession::new("", DESTINATIONS, false).unwrap();
        let err = session.pause().unwrap_err();
        assert_eq!(err.code, "INVALID_STATE");
    }

    #[test]
    fn test_bad_config_rejected() {
        let err = BridgeSession::new(r#"{"penalty_interval_ms": 0}"#, DESTINATIONS, false)
            .err()
            .unwrap();
        assert_eq!(err.code, "INVALID_CONFIG");

        let err = BridgeSession::new("", "[]", false).err().unwrap();
        assert_eq!(err.code, "NO_TARGET");
    }

    #[test]
    fn test_scaled_session_measures_scaled_avatar() {
        let mut session = BridgeSession::new("", DESTINATIONS, true).unwrap();
        session.start_trial(CONTEXT, v(0.0, 0.0), v(5.0, 0.0)).unwrap();
        session.tick(1.0, v(0.0, 0.0), v(8.0, 0.0), false).unwrap();
        let ended = session.end_trial().unwrap();
        let optimal = ended["record"]["optimal_path"].as_f64().unwrap();
        let actual = ended["record"]["actual_path"].as_f64().unwrap();
        assert!((optimal - 5.0).abs() < 1e-4);
        assert!((actual - 3.0).abs() < 1e-4);
    }
}
