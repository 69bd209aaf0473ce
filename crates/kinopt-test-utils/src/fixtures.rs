//! URDF robots used across the test suites.

/// Two revolute joints about Z with a fixed tool mount, moving in the XY
/// plane. Tool at `(0.55, 0, 0.05)` for the zero configuration.
pub const PLANAR_ARM: &str = r#"
<robot name="planar_arm">
    <link name="base"/>
    <link name="upper_link"/>
    <link name="forearm_link"/>
    <link name="tool"/>
    <joint name="shoulder" type="revolute">
        <parent link="base"/><child link="upper_link"/>
        <origin xyz="0 0 0.05"/><axis xyz="0 0 1"/>
        <limit lower="-3.14159" upper="3.14159" effort="10" velocity="2"/>
    </joint>
    <joint name="elbow" type="revolute">
        <parent link="upper_link"/><child link="forearm_link"/>
        <origin xyz="0.3 0 0"/><axis xyz="0 0 1"/>
        <limit lower="-2.5" upper="2.5" effort="10" velocity="2"/>
    </joint>
    <joint name="tool_mount" type="fixed">
        <parent link="forearm_link"/><child link="tool"/>
        <origin xyz="0.25 0 0"/>
    </joint>
</robot>
"#;

/// Yaw-pitch-pitch-roll-pitch-roll arm. Tool at `(0, 0, 0.91)` for the zero
/// configuration.
pub const SIX_DOF_ARM: &str = r#"
<robot name="six_dof_arm">
    <link name="base"/>
    <link name="shoulder_link"/>
    <link name="upper_arm"/>
    <link name="elbow_link"/>
    <link name="forearm"/>
    <link name="wrist_link"/>
    <link name="flange"/>
    <link name="tool"/>
    <joint name="j1_base_yaw" type="revolute">
        <parent link="base"/><child link="shoulder_link"/>
        <origin xyz="0 0 0.05"/><axis xyz="0 0 1"/>
        <limit lower="-3.14159" upper="3.14159" effort="80" velocity="2"/>
    </joint>
    <joint name="j2_shoulder_pitch" type="revolute">
        <parent link="shoulder_link"/><child link="upper_arm"/>
        <origin xyz="0 0 0.2"/><axis xyz="0 1 0"/>
        <limit lower="-1.5708" upper="2.356" effort="60" velocity="2"/>
    </joint>
    <joint name="j3_elbow_pitch" type="revolute">
        <parent link="upper_arm"/><child link="elbow_link"/>
        <origin xyz="0 0 0.3"/><axis xyz="0 1 0"/>
        <limit lower="-2.356" upper="2.356" effort="40" velocity="3"/>
    </joint>
    <joint name="j4_forearm_roll" type="revolute">
        <parent link="elbow_link"/><child link="forearm"/>
        <origin xyz="0 0 0.1"/><axis xyz="0 0 1"/>
        <limit lower="-3.14159" upper="3.14159" effort="20" velocity="5"/>
    </joint>
    <joint name="j5_wrist_pitch" type="revolute">
        <parent link="forearm"/><child link="wrist_link"/>
        <origin xyz="0 0 0.2"/><axis xyz="0 1 0"/>
        <limit lower="-2.094" upper="2.094" effort="10" velocity="5"/>
    </joint>
    <joint name="j6_wrist_roll" type="revolute">
        <parent link="wrist_link"/><child link="flange"/>
        <origin xyz="0 0 0.06"/><axis xyz="0 0 1"/>
        <limit lower="-3.14159" upper="3.14159" effort="5" velocity="8"/>
    </joint>
    <joint name="tool_mount" type="fixed">
        <parent link="flange"/><child link="tool"/>
    </joint>
</robot>
"#;

/// A torso with two 2-DOF arms, for checking configuration ordering.
pub const BRANCHED_ROBOT: &str = r#"
<robot name="branched">
    <link name="torso"/>
    <link name="a_upper"/>
    <link name="a_lower"/>
    <link name="b_upper"/>
    <link name="b_lower"/>
    <joint name="b_shoulder" type="continuous">
        <parent link="torso"/><child link="b_upper"/>
        <origin xyz="0 -0.2 0"/><axis xyz="0 1 0"/>
    </joint>
    <joint name="b_elbow" type="continuous">
        <parent link="b_upper"/><child link="b_lower"/>
        <origin xyz="0 0 -0.3"/><axis xyz="0 1 0"/>
    </joint>
    <joint name="a_shoulder" type="continuous">
        <parent link="torso"/><child link="a_upper"/>
        <origin xyz="0 0.2 0"/><axis xyz="0 1 0"/>
    </joint>
    <joint name="a_elbow" type="continuous">
        <parent link="a_upper"/><child link="a_lower"/>
        <origin xyz="0 0 -0.3"/><axis xyz="0 1 0"/>
    </joint>
</robot>
"#;
