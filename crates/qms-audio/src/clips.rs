//! 语音片段路径约定
//!
//! 片段文件布局是外部硬性契约：
//! - `{audio_path}/{n}.mp3` 号码播报
//! - `{audio_path}/clinic{id}.mp3` 诊所名称
//! - `{audio_path}/ding.mp3` 提示音
//! - `{audio_path}/emergency.mp3` 紧急警报音

use serde::{Deserialize, Serialize};

/// 单个语音片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub name: String,
    pub path: String,
}

impl AudioClip {
    pub fn new(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
        }
    }
}

/// 片段库，按约定生成片段路径
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    audio_path: String,
    emergency_repeats: u32,
}

impl ClipLibrary {
    pub fn new(audio_path: &str) -> Self {
        Self {
            audio_path: audio_path.trim_end_matches('/').to_string(),
            emergency_repeats: 3,
        }
    }

    /// 紧急警报重复次数（来自音频配置，至少一次）
    pub fn with_emergency_repeats(mut self, repeats: u32) -> Self {
        self.emergency_repeats = repeats.max(1);
        self
    }

    /// 叫号提示音
    pub fn ding(&self) -> AudioClip {
        AudioClip::new("ding", format!("{}/ding.mp3", self.audio_path))
    }

    /// 紧急警报音
    pub fn emergency(&self) -> AudioClip {
        AudioClip::new("emergency", format!("{}/emergency.mp3", self.audio_path))
    }

    /// 号码播报片段
    pub fn patient_number(&self, number: i32) -> AudioClip {
        AudioClip::new(
            "patient_number",
            format!("{}/{}.mp3", self.audio_path, number),
        )
    }

    /// 诊所名称片段（按诊所序号定位）
    pub fn clinic_name(&self, clinic_number: i32) -> AudioClip {
        AudioClip::new(
            "clinic_name",
            format!("{}/clinic{}.mp3", self.audio_path, clinic_number),
        )
    }

    /// 叫号播报序列：提示音 + 号码 + 诊所名称
    pub fn patient_call_sequence(&self, patient_number: i32, clinic_number: i32) -> Vec<AudioClip> {
        vec![
            self.ding(),
            self.patient_number(patient_number),
            self.clinic_name(clinic_number),
        ]
    }

    /// 紧急播报序列：警报音按配置次数连播
    pub fn emergency_sequence(&self) -> Vec<AudioClip> {
        (0..self.emergency_repeats).map(|_| self.emergency()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_paths() {
        let lib = ClipLibrary::new("/audio");
        assert_eq!(lib.ding().path, "/audio/ding.mp3");
        assert_eq!(lib.patient_number(15).path, "/audio/15.mp3");
        assert_eq!(lib.clinic_name(3).path, "/audio/clinic3.mp3");
    }

    #[test]
    fn test_emergency_repeats_follow_config() {
        let lib = ClipLibrary::new("/audio");
        assert_eq!(lib.emergency_sequence().len(), 3);

        let lib = ClipLibrary::new("/audio").with_emergency_repeats(5);
        assert_eq!(lib.emergency_sequence().len(), 5);

        // 配置为零时仍播一次
        let lib = ClipLibrary::new("/audio").with_emergency_repeats(0);
        assert_eq!(lib.emergency_sequence().len(), 1);
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let lib = ClipLibrary::new("/audio/");
        assert_eq!(lib.emergency().path, "/audio/emergency.mp3");
    }

    #[test]
    fn test_patient_call_sequence_order() {
        let lib = ClipLibrary::new("/audio");
        let seq = lib.patient_call_sequence(12, 4);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[0].name, "ding");
        assert_eq!(seq[1].path, "/audio/12.mp3");
        assert_eq!(seq[2].path, "/audio/clinic4.mp3");
    }
}
