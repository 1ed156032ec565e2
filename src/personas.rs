//! Preset mentor personas available at start-up.

use crate::models::PersonaProfile;

/// Gender choices offered by the profile form. Free text is accepted too.
pub const GENDER_OPTIONS: [&str; 3] = ["男孩", "女孩", "学生"];

const MUSK_PHILOSOPHY: &str = "关注“第一性原理”。
    1. 基础工程：Python、操作系统内核和硬件物理。
    2. 实践：CTF竞赛、实验室环境搭建和漏洞挖掘。
    3. 伦理：极度强调负责任的披露和法律合规。
    4. 未来：人工智能安全、区块链和量子加密。
    5. 心态：敢于想象，优先解决最难的问题，保持极高强度的工作。";

const KHAN_PHILOSOPHY: &str = "关注“基于掌握的学习法”。
    1. 基础：算法、数据结构和计算机网络。
    2. 概念：加密、身份验证和访问控制。
    3. 实践：通过Wireshark、Nmap等工具进行探索式学习。
    4. 资源：利用免费/低成本平台（可汗学院、B站、开源项目）。
    5. 哲学：构建更安全的数字社区，在动手前先理解“为什么”。";

const FEIFEI_PHILOSOPHY: &str = "关注“以人为本的AI”。
    1. 交叉领域：计算机视觉、深度学习与网络安全的结合。
    2. 安全重点：对抗性样本（Adversarial Examples）、隐私保护计算（联邦学习）。
    3. 伦理：AI伦理、防止算法偏见、数据尊严。
    4. 建议：在学习黑客技术的同时，理解社会科学和心理学。
    5. 愿景：利用AI和安全技术保护人类文明和个人隐私。";

const HINTON_PHILOSOPHY: &str = "关注“神经网络的本质”。
    1. 底层逻辑：微积分、线性代数和反向传播的物理意义。
    2. 安全转型：从传统黑客转向AI模型安全。
    3. 风险预警：自主智能体的对齐问题（Alignment）、人工智能的生存风险。
    4. 实践：构建神经网络并尝试“攻击”它们。
    5. 哲学：理解机器如何“思考”，才能在未来的智能时代保护系统。";

/// The built-in personas, in display order. The first one is selected on start.
pub fn preset_personas() -> Vec<PersonaProfile> {
    vec![
        PersonaProfile::preset("MUSK", "Elon Musk", "第一性原理与颠覆性工程", MUSK_PHILOSOPHY),
        PersonaProfile::preset("KHAN", "Sal Khan", "掌握学习法与道德基石", KHAN_PHILOSOPHY),
        PersonaProfile::preset("FEIFEI", "Fei-Fei Li", "以人为本的AI与视觉安全", FEIFEI_PHILOSOPHY),
        PersonaProfile::preset(
            "HINTON",
            "Geoffrey Hinton",
            "神经网络深度洞察与AI安全",
            HINTON_PHILOSOPHY,
        ),
    ]
}

/// Look up a preset by id, case-insensitively
pub fn find_preset<'a>(presets: &'a [PersonaProfile], id: &str) -> Option<&'a PersonaProfile> {
    presets.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}
