/// Test fixtures: representative JSON payloads from NVE HydAPI.
///
/// Trimmed to the fields the parser reads plus a few it must ignore.
/// Response shapes:
///
///   GET /Stations?StationId={id}
///     data[0].stationId, stationName, masl, lakeName, riverName,
///             latitude, longitude
///     data[0].seriesList[].parameterName, parameter, unit
///
///   GET /Observations?StationId={id}&ResolutionTime=0&Parameter={code}
///     data[0].observations[].time   - RFC 3339, UTC
///     data[0].observations[].value  - number, may be null

/// Narsjø: high-altitude lake station with water level, air temperature
/// and one series outside the recognized set (snow depth).
#[cfg(test)]
pub(crate) fn fixture_station_narsjo_json() -> &'static str {
    r#"{
      "currentLink": "https://hydapi.nve.no/api/v1/Stations?StationId=2.11.0",
      "apiVersion": "1.0",
      "itemCount": 1,
      "data": [{
        "stationId": "2.11.0",
        "stationName": "Narsjø",
        "latitude": 62.35328,
        "longitude": 11.45421,
        "utmEast_Z33": 309221,
        "masl": 737,
        "riverName": "GLOMMA",
        "lakeName": "Narsjøen",
        "councilName": "Os",
        "seriesList": [
          { "parameterName": "Vannstand", "parameter": 1000, "unit": "m", "resolutionList": [] },
          { "parameterName": "Lufttemperatur", "parameter": 17, "unit": "°C", "resolutionList": [] },
          { "parameterName": "Snødybde", "parameter": 2002, "unit": "cm", "resolutionList": [] }
        ]
      }]
    }"#
}

/// Coastal river station, 4 m a.s.l., with a null lake name.
#[cfg(test)]
pub(crate) fn fixture_station_coastal_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "12.209.0",
        "stationName": "Elvemunning",
        "latitude": 59.9,
        "longitude": 10.7,
        "masl": 4,
        "riverName": "Akerselva",
        "lakeName": null,
        "seriesList": [
          { "parameterName": "Vannstand", "parameter": 1000, "unit": "m" },
          { "parameterName": "Vannføring", "parameter": 1001, "unit": "m³/s" }
        ]
      }]
    }"#
}

/// Station with no elevation, lake or river, and no seriesList at all.
#[cfg(test)]
pub(crate) fn fixture_station_sparse_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "7.3.0",
        "stationName": "Fjellstua",
        "latitude": 61.0,
        "longitude": 8.5,
        "masl": null
      }]
    }"#
}

/// Unknown station id: HydAPI answers 200 with an empty data array.
#[cfg(test)]
pub(crate) fn fixture_station_unknown_json() -> &'static str {
    r#"{ "itemCount": 0, "data": [] }"#
}

/// Latest water level observation.
#[cfg(test)]
pub(crate) fn fixture_observation_water_level_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "2.11.0",
        "stationName": "Narsjø",
        "parameter": 1000,
        "parameterName": "Vannstand",
        "parameterNameEng": "Water level",
        "unit": "m",
        "observationCount": 1,
        "observations": [
          { "time": "2024-05-01T12:00:00Z", "value": 2.314, "correction": 0, "quality": 0 }
        ]
      }]
    }"#
}

/// Series with no observations in the requested window.
#[cfg(test)]
pub(crate) fn fixture_observation_empty_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "2.11.0",
        "parameter": 1000,
        "observationCount": 0,
        "observations": []
      }]
    }"#
}

/// Observation with a timestamp but a null value (sensor gap).
#[cfg(test)]
pub(crate) fn fixture_observation_null_value_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "2.11.0",
        "parameter": 1001,
        "observations": [
          { "time": "2024-05-01T12:00:00Z", "value": null, "correction": 0, "quality": 0 }
        ]
      }]
    }"#
}

/// Two samples; the parser must pick the latest one.
#[cfg(test)]
pub(crate) fn fixture_observation_two_samples_json() -> &'static str {
    r#"{
      "data": [{
        "stationId": "2.11.0",
        "parameter": 17,
        "observations": [
          { "time": "2024-05-01T11:00:00Z", "value": 11.0 },
          { "time": "2024-05-01T12:00:00Z", "value": 12.5 }
        ]
      }]
    }"#
}
