#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::commands::SimCommand;
    use crate::components::*;
    use crate::entity::EntityId;
    use crate::enums::*;
    use crate::state::SimSnapshot;
    use crate::types::{Position, Rotation, SimTime};

    #[test]
    fn test_position_frame_serde() {
        let frames = vec![
            PositionFrame::Interstellar,
            PositionFrame::Solar {
                system: EntityId::new(3, 1),
            },
        ];
        for f in frames {
            let json = serde_json::to_string(&f).unwrap();
            let back: PositionFrame = serde_json::from_str(&json).unwrap();
            assert_eq!(f, back);
        }
    }

    #[test]
    fn test_distribution_mode_names() {
        let json = serde_json::to_string(&DistributionMode::MostFirst).unwrap();
        assert_eq!(json, "\"mostFirst\"");
        let back: DistributionMode = serde_json::from_str("\"leastFirst\"").unwrap();
        assert_eq!(back, DistributionMode::LeastFirst);
    }

    #[test]
    fn test_component_kind_all_is_exhaustive_and_unique() {
        let mut kinds = ComponentKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), ComponentKind::ALL.len());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let power: Power = serde_json::from_str(r#"{"requested_power": 4.0}"#).unwrap();
        assert_eq!(power.requested_power, 4.0);
        assert_eq!(power.required_power, Power::default().required_power);

        let engines: ImpulseEngines = serde_json::from_str("{}").unwrap();
        assert_eq!(engines, ImpulseEngines::default());
    }

    #[test]
    fn test_sim_command_serde() {
        let cmds = vec![
            SimCommand::Pause,
            SimCommand::Resume,
            SimCommand::SetTimeScale { scale: 2.0 },
            SimCommand::RemoveEntity {
                id: EntityId::new(1, 0),
            },
            SimCommand::MergeComponent {
                id: EntityId::new(2, 0),
                kind: ComponentKind::ImpulseEngines,
                data: serde_json::json!({ "target_speed": 100.0 }),
            },
            SimCommand::RemoveComponent {
                id: EntityId::new(2, 0),
                kind: ComponentKind::Thrusters,
            },
        ];
        for cmd in cmds {
            let json = serde_json::to_string(&cmd).unwrap();
            let back: SimCommand = serde_json::from_str(&json).unwrap();
            assert_eq!(json, serde_json::to_string(&back).unwrap());
        }
    }

    #[test]
    fn test_rotation_forward_is_plus_z() {
        let r = Rotation::default();
        assert!((r.forward() - DVec3::Z).length() < 1e-12);

        let yawed = Rotation::from_quat(glam::DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2));
        assert!((yawed.forward() - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn test_degenerate_rotation_reads_as_identity() {
        let r = Rotation {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        };
        assert_eq!(r.to_quat(), glam::DQuat::IDENTITY);
    }

    #[test]
    fn test_thrusters_is_thrusting() {
        let mut t = Thrusters::default();
        assert!(!t.is_thrusting());
        t.rotation_delta = DVec3::new(0.0, 0.5, 0.0);
        assert!(t.is_thrusting());
        assert!(t.is_rotating());
        t.rotation_delta = DVec3::ZERO;
        t.direction = DVec3::X;
        assert!(t.is_thrusting());
        assert!(!t.is_rotating());
    }

    #[test]
    fn test_ship_systems_lookup() {
        let a = EntityId::new(5, 0);
        let systems = ShipSystems {
            systems: vec![ShipSystemLink {
                system: a,
                room: Some("engineering".into()),
            }],
        };
        assert!(systems.contains(a));
        assert!(!systems.contains(EntityId::new(5, 1)));
        assert_eq!(systems.ids().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_position_range_and_finite() {
        let a = Position::interstellar(0.0, 0.0, 0.0);
        let b = Position::interstellar(3.0, 4.0, 0.0);
        assert!((a.range_to(&b) - 5.0).abs() < 1e-12);
        let bad = Position::interstellar(f64::NAN, 0.0, 0.0);
        assert!(!bad.is_finite());
    }

    #[test]
    fn test_sim_time_advance() {
        let mut t = SimTime::default();
        t.advance(0.5);
        t.advance(0.5);
        assert_eq!(t.tick, 2);
        assert!((t.elapsed_secs - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = SimSnapshot::default();
        let json = serde_json::to_string(&snap).unwrap();
        let back: SimSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.time, snap.time);
        assert!(back.ships.is_empty());
    }

    #[test]
    fn test_warp_factor_curve() {
        let warp = WarpEngines::default();
        let cruise = warp.solar_cruising_speed;
        assert_eq!(warp.speed_for_factor(0.0, false), 0.0);
        assert!((warp.speed_for_factor(1.0, false) - cruise * 0.01).abs() < 1e-6);
        assert!((warp.speed_for_factor(4.0, false) - cruise).abs() < 1e-6);
        assert!((warp.speed_for_factor(5.0, false) - cruise * 1.25).abs() < 1e-6);
        assert!(
            (warp.speed_for_factor(4.0, true) - warp.interstellar_cruising_speed).abs() < 1.0,
            "interstellar frame uses the interstellar cruise"
        );
        // Above the top factor clamps to emergency.
        assert_eq!(
            warp.speed_for_factor(9.0, false),
            warp.speed_for_factor(5.0, false)
        );

        let mut last = 0.0;
        for step in 1..=50 {
            let speed = warp.speed_for_factor(step as f64 * 0.1, false);
            assert!(speed >= last, "warp curve must be monotone");
            last = speed;
        }
    }

    #[test]
    fn test_warp_factor_inverse() {
        let warp = WarpEngines::default();
        for factor in [0.5, 1.0, 2.5, 4.0, 4.6, 5.0] {
            let speed = warp.speed_for_factor(factor, false);
            let back = warp.factor_for_speed(speed, false);
            assert!((back - factor).abs() < 1e-9, "{factor} -> {speed} -> {back}");
        }
        assert_eq!(warp.factor_for_speed(-3.0, false), 0.0);
        assert_eq!(warp.factor_for_speed(f64::INFINITY, false), 0.0);
        assert_eq!(warp.factor_for_speed(1e30, false), warp.max_factor());
    }
}
