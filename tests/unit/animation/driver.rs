use super::*;

fn seq(ids: &[usize]) -> Vec<ChannelIndex> {
    ids.iter().copied().map(ChannelIndex).collect()
}

fn fps() -> Fps {
    Fps::new(1, 1).unwrap()
}

#[test]
fn visits_in_order_once_without_loop() {
    let mut d = AnimationDriver::default();
    d.arm(seq(&[3, 0, 2]), fps(), false).unwrap();
    let mut seen = Vec::new();
    let n = d
        .run(None, |c| {
            seen.push(c);
            Ok(())
        })
        .unwrap();
    assert_eq!(n, 3);
    assert_eq!(seen, seq(&[3, 0, 2]));
    assert_eq!(d.state(), DriverState::Finished);
    assert_eq!(d.next_frame(), None);
}

#[test]
fn looping_wraps_and_stops_on_request() {
    let sequence = seq(&[0, 1, 2, 3]);
    for n in [1_u64, 4, 5, 11] {
        let mut d = AnimationDriver::default();
        d.arm(sequence.clone(), fps(), true).unwrap();
        let delivered = d.run(Some(n), |_| Ok(())).unwrap();
        d.stop();
        assert_eq!(delivered, n);
        assert_eq!(d.state(), DriverState::Paused);
        let expected = sequence[((n - 1) % sequence.len() as u64) as usize];
        assert_eq!(d.last_visited(), Some(expected));
    }
}

#[test]
fn stop_then_start_resumes_position() {
    let mut d = AnimationDriver::default();
    d.arm(seq(&[5, 6, 7]), fps(), false).unwrap();
    assert_eq!(d.next_frame(), Some(ChannelIndex(5)));
    d.stop();
    assert_eq!(d.state(), DriverState::Paused);
    assert_eq!(d.next_frame(), None);
    d.start().unwrap();
    assert_eq!(d.next_frame(), Some(ChannelIndex(6)));
    assert_eq!(d.next_frame(), Some(ChannelIndex(7)));
    assert_eq!(d.state(), DriverState::Finished);
    assert!(d.start().is_err());
}

#[test]
fn stop_token_pauses_at_tick_boundary() {
    let token = StopToken::new();
    let mut d = AnimationDriver::default().with_stop_token(token.clone());
    d.arm(seq(&[0, 1, 2]), fps(), true).unwrap();
    let delivered = d
        .run(None, |c| {
            if c == ChannelIndex(1) {
                token.request_stop();
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(d.state(), DriverState::Paused);
    assert_eq!(d.last_visited(), Some(ChannelIndex(1)));
}

#[test]
fn callback_error_forces_finished() {
    let mut d = AnimationDriver::default();
    d.arm(seq(&[0, 1, 2]), fps(), true).unwrap();
    let err = d
        .run(None, |c| {
            if c == ChannelIndex(1) {
                Err(CubeMovieError::render("boom"))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
    assert!(matches!(err, CubeMovieError::Render(_)));
    assert_eq!(d.state(), DriverState::Finished);
    assert_eq!(d.ticks(), 2);
}

#[test]
fn arm_requires_idle_and_a_sequence() {
    let mut d = AnimationDriver::default();
    assert!(d.arm(Vec::new(), fps(), false).is_err());
    d.arm(seq(&[0]), fps(), false).unwrap();
    assert!(d.arm(seq(&[0]), fps(), false).is_err());
    d.reset();
    assert_eq!(d.state(), DriverState::Idle);
    assert!(d.session().is_none());
    d.arm(seq(&[1]), fps(), false).unwrap();
    assert_eq!(d.session().map(|s| s.position), Some(0));
}
